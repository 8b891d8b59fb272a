use crate::{multiset::MultisetU4x16, rules::Rules, score::Scored};
use claim::debug_assert_le;
use rand::{
    distributions::{Distribution, Uniform},
    Rng, SeedableRng,
};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::{collections::BTreeSet, fmt, ops, sync::Arc};
use thiserror::Error;

/// The RNG every dice set uses unless one is injected.
pub type DiceRng = Xoshiro256PlusPlus;

////////////////
// FaceCounts //
////////////////

/// A set of die faces, represented as a multiset of face counts packed into a
/// u64. Visually,
///
/// `FFFF EEEE .. 2222 1111 XXXX`, where `XXXX` is unused (there is no face 0)
/// and `NNNN` is the number of dice showing face `N`.
///
/// This representation has the added benefit of being order invariant, since
/// the order of dice in a set is not important.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct FaceCounts(MultisetU4x16);

impl FaceCounts {
    /// A new empty set of faces.
    #[inline]
    pub const fn new() -> Self {
        Self(MultisetU4x16::new())
    }

    /// A convenience function for constructing a `FaceCounts` set from an
    /// unordered list of faces.
    pub fn from_faces(faces: &[u8]) -> Self {
        faces.iter().copied().collect()
    }

    /// `count` dice all showing `face`.
    #[inline]
    pub fn from_count(face: u8, count: u8) -> Self {
        Self(MultisetU4x16::from_count(face, count))
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    // The number of dice in this set
    #[inline]
    pub fn len(self) -> u8 {
        self.0.len()
    }

    #[inline]
    pub fn get_count(self, face: u8) -> u8 {
        self.0.get_count(face)
    }

    #[inline]
    pub fn is_superset_of(self, other: Self) -> bool {
        self.0.is_superset_of(other.0)
    }

    /// All faces in ascending order, repeated by their count.
    pub fn faces(self) -> impl Iterator<Item = u8> {
        self.0
            .into_iter()
            .flat_map(|(face, count)| std::iter::repeat(face).take(count as usize))
    }
}

impl ops::Add for FaceCounts {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl ops::Sub for FaceCounts {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl FromIterator<u8> for FaceCounts {
    #[inline]
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = u8>,
    {
        Self(MultisetU4x16::from_iter_flat(iter.into_iter()))
    }
}

impl fmt::Debug for FaceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.faces()).finish()
    }
}

impl fmt::Display for FaceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, face) in self.faces().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", face)?;
        }
        f.write_str("]")
    }
}

/////////
// Die //
/////////

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum DieError {
    #[error("die is frozen")]
    Frozen,
    #[error("cannot freeze an unrolled die")]
    Unrolled,
    #[error("cannot freeze a frozen die")]
    AlreadyFrozen,
}

/// A single die: created unrolled, rolled to get a face, and optionally frozen
/// until the owning dice set resets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Die {
    value: Option<u8>,
    frozen: bool,
}

impl Die {
    #[inline]
    pub const fn new() -> Self {
        Self {
            value: None,
            frozen: false,
        }
    }

    #[inline]
    pub fn value(&self) -> Option<u8> {
        self.value
    }

    #[inline]
    pub fn is_rolled(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn roll<R, D>(&mut self, rng: &mut R, distr: &D) -> Result<u8, DieError>
    where
        R: Rng + ?Sized,
        D: Distribution<u8>,
    {
        if self.frozen {
            return Err(DieError::Frozen);
        }
        let face = distr.sample(rng);
        self.value = Some(face);
        Ok(face)
    }

    pub fn freeze(&mut self) -> Result<(), DieError> {
        if self.value.is_none() {
            return Err(DieError::Unrolled);
        }
        if self.frozen {
            return Err(DieError::AlreadyFrozen);
        }
        self.frozen = true;
        Ok(())
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/////////////
// DiceSet //
/////////////

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DiceSetError {
    #[error("must freeze at least one die before rolling again")]
    MustFreezeFirst,
    #[error("must freeze at least one rolled die")]
    NothingToFreeze,
    #[error("a selected die is already frozen")]
    AlreadyFrozen,
    #[error("some dice didn't score: {unscored}")]
    InvalidSelection { unscored: FaceCounts },
    #[error("no die at index {index}, there are only {num_dice} dice")]
    IndexOutOfRange { index: usize, num_dice: usize },
    #[error("turn points would overflow")]
    PointsOverflow,
    #[error(transparent)]
    Die(#[from] DieError),
}

/// What a successful [`DiceSet::roll`] turned up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RollOutcome {
    /// At least one of the freshly rolled dice scores.
    Rolled,
    /// Nothing scored. The dice set has already been reset and this turn's
    /// points are gone.
    Farkel,
}

/// The dice one player rolls during a turn, plus the points frozen so far.
///
/// `roll_ok` gates rolling: it is cleared by every roll and set again by the
/// first valid freeze, so the dice can never be rolled twice in a row.
#[derive(Clone, Debug)]
pub struct DiceSet<R = DiceRng> {
    dice: Vec<Die>,
    points: u32,
    roll_ok: bool,
    rules: Arc<Rules>,
    rng: R,
}

impl DiceSet<DiceRng> {
    /// A dice set with an entropy-seeded RNG.
    pub fn new(rules: Arc<Rules>) -> Self {
        Self::with_rng(rules, DiceRng::from_entropy())
    }

    /// A dice set whose rolls are fully determined by `seed`.
    pub fn seeded(rules: Arc<Rules>, seed: u64) -> Self {
        Self::with_rng(rules, DiceRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DiceSet<R> {
    pub fn with_rng(rules: Arc<Rules>, rng: R) -> Self {
        let num_dice = rules.config().num_dice as usize;
        Self {
            dice: vec![Die::new(); num_dice],
            points: 0,
            roll_ok: true,
            rules,
            rng,
        }
    }

    #[inline]
    pub fn rules(&self) -> &Arc<Rules> {
        &self.rules
    }

    #[inline]
    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    /// Points frozen so far this turn.
    #[inline]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[inline]
    pub fn roll_ok(&self) -> bool {
        self.roll_ok
    }

    pub fn all_frozen(&self) -> bool {
        self.dice.iter().all(Die::is_frozen)
    }

    pub fn num_unfrozen(&self) -> usize {
        self.dice.iter().filter(|die| !die.is_frozen()).count()
    }

    /// The face of every die, with frozen (or unrolled) dice hidden.
    pub fn visible_faces(&self) -> Vec<Option<u8>> {
        self.dice
            .iter()
            .map(|die| if die.is_frozen() { None } else { die.value() })
            .collect()
    }

    fn unfrozen_counts(&self) -> FaceCounts {
        self.dice
            .iter()
            .filter(|die| !die.is_frozen())
            .filter_map(Die::value)
            .collect()
    }

    /// Score every unfrozen die at once.
    pub fn score_unfrozen(&self) -> Scored {
        self.rules.table().score(self.unfrozen_counts())
    }

    /// Return true if none of the unfrozen dice score.
    #[inline]
    pub fn is_farkel(&self) -> bool {
        self.score_unfrozen().is_farkel()
    }

    /// Roll every unfrozen die. A roll with no scoring dice is a Farkel, which
    /// resets the whole dice set, points included.
    pub fn roll(&mut self) -> Result<RollOutcome, DiceSetError> {
        if !self.roll_ok {
            return Err(DiceSetError::MustFreezeFirst);
        }

        let rules = Arc::clone(&self.rules);
        let distr: &Uniform<u8> = rules.face_distr();
        for die in self.dice.iter_mut().filter(|die| !die.is_frozen()) {
            die.roll(&mut self.rng, distr)?;
        }
        self.roll_ok = false;

        Ok(self.settle_roll())
    }

    fn settle_roll(&mut self) -> RollOutcome {
        if self.is_farkel() {
            self.reset(false);
            RollOutcome::Farkel
        } else {
            RollOutcome::Rolled
        }
    }

    /// Freeze the dice at `indices`, which must all score together. Returns
    /// the points they added. On error the dice set is left untouched.
    pub fn freeze_selection(
        &mut self,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<u32, DiceSetError> {
        if self.roll_ok {
            return Err(DiceSetError::NothingToFreeze);
        }

        let num_dice = self.dice.len();
        let mut selection = BTreeSet::new();
        for index in indices {
            if index >= num_dice {
                return Err(DiceSetError::IndexOutOfRange { index, num_dice });
            }
            selection.insert(index);
        }

        if selection.is_empty() {
            return Err(DiceSetError::NothingToFreeze);
        }
        if selection.iter().any(|&idx| self.dice[idx].is_frozen()) {
            return Err(DiceSetError::AlreadyFrozen);
        }

        let counts = selection
            .iter()
            .map(|&idx| self.dice[idx].value().ok_or(DieError::Unrolled))
            .collect::<Result<FaceCounts, _>>()?;

        let scored = self.rules.table().score(counts);
        if !scored.is_complete() {
            return Err(DiceSetError::InvalidSelection {
                unscored: scored.unscored,
            });
        }

        let points = self
            .points
            .checked_add(scored.points)
            .ok_or(DiceSetError::PointsOverflow)?;

        for &idx in &selection {
            self.dice[idx].freeze()?;
        }
        self.points = points;
        self.roll_ok = true;

        Ok(scored.points)
    }

    /// Take over another dice set's dice and points, e.g. the previous
    /// player's unfinished roll.
    pub fn inherit<S>(&mut self, other: &DiceSet<S>) {
        debug_assert_le!(other.dice.len(), self.dice.len());

        for (die, other_die) in self.dice.iter_mut().zip(&other.dice) {
            *die = *other_die;
        }
        self.points = other.points;
        self.roll_ok = true;
    }

    pub fn reset(&mut self, keep_score: bool) {
        for die in &mut self.dice {
            die.reset();
        }
        self.roll_ok = true;
        if !keep_score {
            self.points = 0;
        }
    }
}

cfg_test! {
    impl<R: Rng> DiceSet<R> {
        /// Pretend the unfrozen dice just rolled `faces`, in order.
        pub(crate) fn rig_roll(&mut self, faces: &[u8]) {
            assert_eq!(self.num_unfrozen(), faces.len());

            let mut faces = faces.iter().copied();
            for die in self.dice.iter_mut().filter(|die| !die.is_frozen()) {
                die.value = faces.next();
            }
            self.roll_ok = false;
        }
    }
}


///////////
// Tests //
///////////
