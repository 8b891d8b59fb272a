//! Per-player turn bookkeeping: qualification, banking, and the consecutive
//! Farkel penalty.

use crate::{
    dice::{DiceRng, DiceSet, DiceSetError, RollOutcome},
    rules::Rules,
};
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("need {required} points to qualify, player has {points}")]
    NotQualified { required: u32, points: u32 },
}

/// The result of a successful [`Player::roll`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnRoll {
    /// The visible faces after the roll; frozen dice are `None`.
    Rolled(Vec<Option<u8>>),
    /// The roll scored nothing and the turn is over. `penalized` is set when
    /// this Farkel hit the consecutive limit and cost banked points.
    Farkel { penalized: bool },
}

/// The result of a successful [`Player::bank_points`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Banked {
    /// The player just qualified. Nothing was added to their score.
    Qualified(u32),
    /// The points were added to the player's score.
    Points(u32),
}

#[derive(Clone, Debug)]
pub struct Player<R = DiceRng> {
    name: String,
    qualified: bool,
    score: i64,
    farkel_count: u32,
    active: bool,
    dice_set: DiceSet<R>,
}

impl Player<DiceRng> {
    pub fn new(rules: Arc<Rules>, name: impl Into<String>) -> Self {
        Self::from_dice_set(DiceSet::new(rules), name)
    }

    pub fn seeded(rules: Arc<Rules>, seed: u64, name: impl Into<String>) -> Self {
        Self::from_dice_set(DiceSet::seeded(rules, seed), name)
    }
}

impl<R: Rng> Player<R> {
    pub fn with_rng(rules: Arc<Rules>, rng: R, name: impl Into<String>) -> Self {
        Self::from_dice_set(DiceSet::with_rng(rules, rng), name)
    }

    fn from_dice_set(dice_set: DiceSet<R>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified: false,
            score: 0,
            farkel_count: 0,
            active: false,
            dice_set,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn qualified(&self) -> bool {
        self.qualified
    }

    /// The banked score. Penalties can push it below zero.
    #[inline]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[inline]
    pub fn farkel_count(&self) -> u32 {
        self.farkel_count
    }

    #[inline]
    pub fn dice_set(&self) -> &DiceSet<R> {
        &self.dice_set
    }

    #[inline]
    pub fn dice_set_mut(&mut self) -> &mut DiceSet<R> {
        &mut self.dice_set
    }

    #[inline]
    pub fn make_active(&mut self) {
        self.active = true;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_win_condition_met(&self) -> bool {
        self.score >= self.dice_set.rules().config().win_score
    }

    /// Roll the unfrozen dice. With every die frozen ("hot dice") the dice
    /// set is reset first, keeping its points, so all of them roll again.
    pub fn roll(&mut self) -> Result<TurnRoll, DiceSetError> {
        if self.dice_set.all_frozen() {
            self.dice_set.reset(true);
        }
        let outcome = self.dice_set.roll()?;
        Ok(self.apply_roll(outcome))
    }

    fn apply_roll(&mut self, outcome: RollOutcome) -> TurnRoll {
        match outcome {
            RollOutcome::Rolled => TurnRoll::Rolled(self.dice_set.visible_faces()),
            RollOutcome::Farkel => {
                self.active = false;

                let mut penalized = false;
                if self.qualified {
                    self.farkel_count += 1;

                    let config = self.dice_set.rules().config();
                    if self.farkel_count >= config.farkel_limit {
                        self.score -= i64::from(config.farkel_penalty);
                        self.farkel_count = 0;
                        penalized = true;
                    }
                }
                TurnRoll::Farkel { penalized }
            }
        }
    }

    pub fn freeze_selection(
        &mut self,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<u32, DiceSetError> {
        self.dice_set.freeze_selection(indices)
    }

    /// End the turn, keeping this turn's points. The first successful bank
    /// only qualifies the player.
    pub fn bank_points(&mut self) -> Result<Banked, PlayerError> {
        let points = self.dice_set.points();

        let banked = if self.qualified {
            self.score += i64::from(points);
            self.farkel_count = 0;
            Banked::Points(points)
        } else {
            let required = self.dice_set.rules().config().qualification_points;
            if points < required {
                return Err(PlayerError::NotQualified { required, points });
            }
            self.qualified = true;
            Banked::Qualified(points)
        };

        self.active = false;
        Ok(banked)
    }
}

cfg_test! {
    impl<R: Rng> Player<R> {
        pub(crate) fn set_qualified(&mut self, qualified: bool) {
            self.qualified = qualified;
        }

        pub(crate) fn set_score(&mut self, score: i64) {
            self.score = score;
        }
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    fn player() -> Player {
        Player::seeded(Rules::standard(), 42, "Player 1")
    }

    /// Roll for real until the player Farkels.
    fn roll_until_farkel(player: &mut Player) -> bool {
        for _ in 0..10_000 {
            player.make_active();
            player.dice_set_mut().reset(false);
            if let TurnRoll::Farkel { penalized } = player.roll().unwrap() {
                return penalized;
            }
        }
        panic!("never rolled a Farkel");
    }

    #[test]
    fn test_new_player() {
        let player = player();
        assert_eq!("Player 1", player.name());
        assert!(!player.qualified());
        assert!(!player.is_active());
        assert_eq!(0, player.score());
        assert_eq!(0, player.farkel_count());
        assert_eq!(0, player.dice_set().points());
    }

    #[test]
    fn test_multiple_scoring() {
        let mut player = player();
        player.set_qualified(true);
        player.make_active();

        player.dice_set_mut().rig_roll(&[1, 2, 3, 4, 6, 6]);
        assert_eq!(Ok(100), player.freeze_selection([0]));

        player.dice_set_mut().rig_roll(&[5, 2, 3, 6, 4]);
        assert_eq!(Ok(50), player.freeze_selection([1]));

        assert_eq!(Ok(Banked::Points(150)), player.bank_points());
        assert_eq!(150, player.score());
        assert!(!player.is_active());
    }

    #[test]
    fn test_quads_scoring() {
        let mut player = player();
        player.set_qualified(true);

        player.dice_set_mut().rig_roll(&[1, 1, 1, 1, 2, 3]);
        assert_eq!(Ok(1000), player.freeze_selection(0..4));
        assert_eq!(1000, player.dice_set().points());

        assert_eq!(Ok(Banked::Points(1000)), player.bank_points());
        assert_eq!(1000, player.score());
    }

    #[test]
    fn test_qualification() {
        let mut player = player();
        player.make_active();

        player.dice_set_mut().rig_roll(&[5, 2, 3, 4, 6, 6]);
        player.freeze_selection([0]).unwrap();
        assert_eq!(
            Err(PlayerError::NotQualified {
                required: 500,
                points: 50
            }),
            player.bank_points()
        );
        assert!(!player.qualified());
        assert!(player.is_active());
        assert_eq!(0, player.score());

        // hot dice: all six score together, then the player can qualify
        player.dice_set_mut().reset(true);
        player.dice_set_mut().rig_roll(&[6, 6, 1, 1, 6, 5]);
        assert_eq!(Ok(850), player.freeze_selection(0..6));
        assert_eq!(Ok(Banked::Qualified(900)), player.bank_points());
        assert!(player.qualified());
        assert_eq!(0, player.score());
        assert!(!player.is_active());

        // once qualified, banking adds to the score
        player.dice_set_mut().reset(false);
        player.make_active();
        player.dice_set_mut().rig_roll(&[3, 3, 5, 6, 6, 4]);
        player.freeze_selection([2]).unwrap();
        assert_eq!(Ok(Banked::Points(50)), player.bank_points());
        assert_eq!(50, player.score());
    }

    #[test]
    fn test_roll_with_all_frozen_keeps_points() {
        let mut player = player();
        player.make_active();

        player.dice_set_mut().rig_roll(&[1, 1, 1, 5, 5, 5]);
        assert_eq!(Ok(2500), player.freeze_selection(0..6));
        assert!(player.dice_set().all_frozen());

        match player.roll().unwrap() {
            TurnRoll::Rolled(faces) => {
                assert_eq!(6, faces.len());
                assert!(faces.iter().all(Option::is_some));
                assert_eq!(2500, player.dice_set().points());
                assert!(player.is_active());
            }
            TurnRoll::Farkel { .. } => {
                assert_eq!(0, player.dice_set().points());
                assert!(!player.is_active());
            }
        }
    }

    #[test]
    fn test_unqualified_farkel_is_free() {
        let mut player = player();
        player.set_score(2000);

        assert!(!roll_until_farkel(&mut player));
        assert!(!player.is_active());
        assert_eq!(0, player.farkel_count());
        assert_eq!(2000, player.score());
        assert_eq!(0, player.dice_set().points());
    }

    #[test]
    fn test_triple_farkel_and_score() {
        let mut player = player();
        player.set_qualified(true);
        player.set_score(2000);

        assert!(!roll_until_farkel(&mut player));
        assert_eq!(1, player.farkel_count());
        assert!(!player.is_active());

        assert!(!roll_until_farkel(&mut player));
        assert_eq!(2, player.farkel_count());
        assert_eq!(2000, player.score());

        assert!(roll_until_farkel(&mut player));
        assert_eq!(0, player.farkel_count());
        assert_eq!(1000, player.score());
    }

    #[test]
    fn test_bank_resets_farkel_count() {
        let mut player = player();
        player.set_qualified(true);

        roll_until_farkel(&mut player);
        assert_eq!(1, player.farkel_count());

        player.make_active();
        player.dice_set_mut().reset(false);
        player.dice_set_mut().rig_roll(&[1, 2, 3, 4, 6, 6]);
        player.freeze_selection([0]).unwrap();
        player.bank_points().unwrap();
        assert_eq!(0, player.farkel_count());
        assert_eq!(100, player.score());
    }

    #[test]
    fn test_penalized_farkel_never_raises_score() {
        let config = Config {
            farkel_limit: 1,
            farkel_penalty: 1000,
            ..Config::default()
        };
        let rules = Arc::new(Rules::new(config).unwrap());
        let mut player = Player::seeded(rules, 42, "Player 1");
        player.set_qualified(true);

        assert!(roll_until_farkel(&mut player));
        assert_eq!(-1000, player.score());
        assert_eq!(0, player.farkel_count());
    }

    #[test]
    fn test_penalty_can_go_negative() {
        let mut player = player();
        player.set_qualified(true);

        for _ in 0..3 {
            roll_until_farkel(&mut player);
        }
        assert_eq!(-1000, player.score());
        assert!(!player.is_win_condition_met());
    }

    #[test]
    fn test_win_condition() {
        let mut player = player();
        player.set_score(9_999);
        assert!(!player.is_win_condition_met());
        player.set_score(10_000);
        assert!(player.is_win_condition_met());
    }
}
