//! The rule table: every scoring pattern the game recognizes, in the order the
//! scoring engine tries them.
//!
//! Patterns are generated from a [`Config`], deduplicated on their canonical
//! face multiset, and sorted by descending points. Ties go to the larger
//! pattern, so four 1s score as four of a kind rather than a triple plus a
//! single; any remaining ties keep generation order.

use crate::{
    config::{Config, ConfigError},
    dice::FaceCounts,
};
use itertools::{iproduct, Itertools};
use rand::distributions::Uniform;
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

///////////
// Combo //
///////////

/// The named combination a pattern belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Combo {
    SingleOne,
    SingleFive,
    Triple(u8),
    Straight,
    FourOfAKind(u8),
    FiveOfAKind(u8),
    SixOfAKind(u8),
    ThreePairs,
    TwoTriplets,
    FourOfAKindPlusPair,
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleOne => f.write_str("single one"),
            Self::SingleFive => f.write_str("single five"),
            Self::Triple(face) => write!(f, "three {}s", face),
            Self::Straight => f.write_str("straight"),
            Self::FourOfAKind(face) => write!(f, "four {}s", face),
            Self::FiveOfAKind(face) => write!(f, "five {}s", face),
            Self::SixOfAKind(face) => write!(f, "six {}s", face),
            Self::ThreePairs => f.write_str("three pairs"),
            Self::TwoTriplets => f.write_str("two triplets"),
            Self::FourOfAKindPlusPair => f.write_str("four of a kind + pair"),
        }
    }
}

/////////////
// Pattern //
/////////////

/// A multiset of faces worth a fixed number of points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    combo: Combo,
    counts: FaceCounts,
    points: u32,
}

impl Pattern {
    pub fn new(combo: Combo, counts: FaceCounts, points: u32) -> Self {
        Self {
            combo,
            counts,
            points,
        }
    }

    #[inline]
    pub fn combo(&self) -> Combo {
        self.combo
    }

    #[inline]
    pub fn counts(&self) -> FaceCounts {
        self.counts
    }

    #[inline]
    pub fn points(&self) -> u32 {
        self.points
    }
}

///////////////
// RuleTable //
///////////////

#[derive(Clone, Debug)]
pub struct RuleTable {
    patterns: Vec<Pattern>,
}

impl RuleTable {
    pub fn new(config: &Config) -> Self {
        let faces = config.faces();
        let points = &config.points;

        let n_of_a_kind = |face: u8, n: u8| FaceCounts::from_count(face, n);

        let mut patterns = Vec::new();

        // singles, triples, and the straight
        if faces.contains(&1) {
            patterns.push(Pattern::new(Combo::SingleOne, n_of_a_kind(1, 1), points.single_one));
        }
        if faces.contains(&5) {
            patterns.push(Pattern::new(Combo::SingleFive, n_of_a_kind(5, 1), points.single_five));
        }
        for face in faces.clone() {
            if let Some(triple) = config.triple_points(face) {
                patterns.push(Pattern::new(Combo::Triple(face), n_of_a_kind(face, 3), triple));
            }
        }
        patterns.push(Pattern::new(
            Combo::Straight,
            faces.clone().collect(),
            points.straight,
        ));

        // four, five, and six of a kind
        for face in faces.clone() {
            patterns.push(Pattern::new(
                Combo::FourOfAKind(face),
                n_of_a_kind(face, 4),
                points.four_of_a_kind,
            ));
        }
        for face in faces.clone() {
            patterns.push(Pattern::new(
                Combo::FiveOfAKind(face),
                n_of_a_kind(face, 5),
                points.five_of_a_kind,
            ));
        }
        for face in faces.clone() {
            patterns.push(Pattern::new(
                Combo::SixOfAKind(face),
                n_of_a_kind(face, 6),
                points.six_of_a_kind,
            ));
        }

        // the multi-group combos are generated as ordered products, so the
        // same multiset shows up once per permutation until deduplicated.
        let three_pairs = iproduct!(faces.clone(), faces.clone(), faces.clone())
            .filter(|&(i, j, k)| i != j && i != k && j != k)
            .map(|(i, j, k)| {
                Pattern::new(
                    Combo::ThreePairs,
                    n_of_a_kind(i, 2) + n_of_a_kind(j, 2) + n_of_a_kind(k, 2),
                    points.three_pairs,
                )
            });
        patterns.extend(dedup_patterns(three_pairs));

        let two_triplets = iproduct!(faces.clone(), faces.clone())
            .filter(|&(i, j)| i != j)
            .map(|(i, j)| {
                Pattern::new(
                    Combo::TwoTriplets,
                    n_of_a_kind(i, 3) + n_of_a_kind(j, 3),
                    points.two_triplets,
                )
            });
        patterns.extend(dedup_patterns(two_triplets));

        let quad_plus_pair = iproduct!(faces.clone(), faces)
            .filter(|&(quad, pair)| quad != pair)
            .map(|(quad, pair)| {
                Pattern::new(
                    Combo::FourOfAKindPlusPair,
                    n_of_a_kind(quad, 4) + n_of_a_kind(pair, 2),
                    points.four_of_a_kind_plus_pair,
                )
            });
        patterns.extend(dedup_patterns(quad_plus_pair));

        // a pattern needing more dice than we have can never match
        patterns.retain(|pattern| pattern.counts.len() <= config.num_dice);

        // stable sort: descending points, then larger patterns first
        patterns.sort_by(|p1, p2| {
            p2.points
                .cmp(&p1.points)
                .then_with(|| p2.counts.len().cmp(&p1.counts.len()))
        });

        Self { patterns }
    }

    #[inline]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// The highest-precedence pattern contained in `counts`.
    pub fn first_match(&self, counts: FaceCounts) -> Option<&Pattern> {
        self.patterns
            .iter()
            .find(|pattern| counts.is_superset_of(pattern.counts))
    }
}

/// Collapse patterns with the same faces and points into the first one seen.
fn dedup_patterns(patterns: impl Iterator<Item = Pattern>) -> impl Iterator<Item = Pattern> {
    patterns.unique_by(|pattern| (pattern.counts, pattern.points))
}

///////////
// Rules //
///////////

/// A validated config together with everything derived from it. Shared
/// read-only by every dice set in a match.
#[derive(Clone, Debug)]
pub struct Rules {
    config: Config,
    table: RuleTable,
    face_distr: Uniform<u8>,
}

impl Rules {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let table = RuleTable::new(&config);
        let face_distr = Uniform::new_inclusive(config.low_face, config.high_face);

        Ok(Self {
            config,
            table,
            face_distr,
        })
    }

    /// The standard ruleset, built once per process.
    pub fn standard() -> Arc<Self> {
        static STANDARD: OnceLock<Arc<Rules>> = OnceLock::new();

        STANDARD
            .get_or_init(|| {
                Arc::new(Rules::new(Config::default()).expect("the default config is valid"))
            })
            .clone()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    #[inline]
    pub fn face_distr(&self) -> &Uniform<u8> {
        &self.face_distr
    }
}

///////////
// Tests //
///////////
