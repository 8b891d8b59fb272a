//! Greedy decomposition of a set of dice into scoring patterns.

use crate::{
    dice::FaceCounts,
    rules::{Pattern, RuleTable},
};

/// The result of scoring a set of dice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scored {
    /// Total points of every matched pattern.
    pub points: u32,
    /// Matched patterns, in the order they were taken.
    pub matched: Vec<Pattern>,
    /// Dice left over after no further pattern applied.
    pub unscored: FaceCounts,
}

impl Scored {
    /// Every die contributed to a pattern.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unscored.is_empty()
    }

    /// Nothing scored at all.
    #[inline]
    pub fn is_farkel(&self) -> bool {
        self.points == 0
    }

    /// The dice consumed by the matched patterns.
    pub fn consumed(&self) -> FaceCounts {
        self.matched
            .iter()
            .fold(FaceCounts::new(), |acc, pattern| acc + pattern.counts())
    }
}

impl RuleTable {
    /// Repeatedly take the highest-precedence pattern still contained in the
    /// remaining dice until none applies.
    ///
    /// This is greedy, not optimal: it commits to the first match in table
    /// order and never backtracks.
    pub fn score(&self, counts: FaceCounts) -> Scored {
        fn rec(table: &RuleTable, remaining: FaceCounts, scored: &mut Scored) {
            match table.first_match(remaining) {
                Some(pattern) => {
                    scored.points += pattern.points();
                    scored.matched.push(*pattern);
                    rec(table, remaining - pattern.counts(), scored);
                }
                None => scored.unscored = remaining,
            }
        }

        let mut scored = Scored::default();
        rec(self, counts, &mut scored);
        scored
    }
}

///////////
// Tests //
///////////
