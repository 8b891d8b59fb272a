//! Game configuration.
//!
//! Every constant the engine consumes lives here: the number of dice, the face
//! range, the qualification and win thresholds, the consecutive-Farkel limit
//! and penalty, and the point value of every named scoring combination.
//! [`Config::default`] is the standard ruleset. A JSON file may override any
//! subset of fields; everything left out keeps its standard value.

use serde::{Deserialize, Serialize};
use std::{fs, ops::RangeInclusive, path::Path};
use thiserror::Error;

/// The largest face value and the largest number of dice the packed face
/// multiset can represent.
pub const MAX_FACE: u8 = 15;
pub const MAX_DICE: u8 = 15;

/// The most any single pattern may be worth. With at most [`MAX_DICE`] dice
/// a single scoring pass stays far below `u32::MAX`.
pub const MAX_PATTERN_POINTS: u32 = 1_000_000;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of dice in a dice set.
    pub num_dice: u8,
    /// Lowest face value on a die.
    pub low_face: u8,
    /// Highest face value on a die.
    pub high_face: u8,
    /// Points a player must accumulate in one turn before they may ever bank.
    pub qualification_points: u32,
    /// Banked score that starts the final lap.
    pub win_score: i64,
    /// Consecutive Farkels (while qualified) that trigger the penalty.
    pub farkel_limit: u32,
    /// Points subtracted from the banked score when the limit is reached.
    pub farkel_penalty: u32,
    pub points: PointTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_dice: 6,
            low_face: 1,
            high_face: 6,
            qualification_points: 500,
            win_score: 10_000,
            farkel_limit: 3,
            farkel_penalty: 1000,
            points: PointTable::default(),
        }
    }
}

/// The value of each named scoring combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointTable {
    pub single_one: u32,
    pub single_five: u32,
    /// Three of a kind, one entry per face from `low_face` to `high_face`.
    pub triples: Vec<u32>,
    pub straight: u32,
    pub four_of_a_kind: u32,
    pub five_of_a_kind: u32,
    pub six_of_a_kind: u32,
    pub three_pairs: u32,
    pub two_triplets: u32,
    pub four_of_a_kind_plus_pair: u32,
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            single_one: 100,
            single_five: 50,
            triples: vec![1000, 200, 300, 400, 500, 600],
            straight: 1500,
            four_of_a_kind: 1000,
            five_of_a_kind: 2000,
            six_of_a_kind: 3000,
            three_pairs: 1500,
            two_triplets: 2500,
            four_of_a_kind_plus_pair: 1500,
        }
    }
}

impl PointTable {
    /// Every configured value, labeled by its field name.
    fn labeled_values(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        [
            ("single_one", self.single_one),
            ("single_five", self.single_five),
            ("straight", self.straight),
            ("four_of_a_kind", self.four_of_a_kind),
            ("five_of_a_kind", self.five_of_a_kind),
            ("six_of_a_kind", self.six_of_a_kind),
            ("three_pairs", self.three_pairs),
            ("two_triplets", self.two_triplets),
            ("four_of_a_kind_plus_pair", self.four_of_a_kind_plus_pair),
        ]
        .into_iter()
        .chain(self.triples.iter().map(|&points| ("triples", points)))
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    #[inline]
    pub fn faces(&self) -> RangeInclusive<u8> {
        self.low_face..=self.high_face
    }

    #[inline]
    pub fn num_faces(&self) -> u8 {
        self.high_face - self.low_face + 1
    }

    /// The three-of-a-kind value for `face`, if `face` is in range.
    pub fn triple_points(&self, face: u8) -> Option<u32> {
        if !self.faces().contains(&face) {
            return None;
        }
        self.points.triples.get((face - self.low_face) as usize).copied()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(1..=MAX_DICE).contains(&self.num_dice) {
            return invalid(format!(
                "num_dice must be in the range [1, {}]: {}",
                MAX_DICE, self.num_dice
            ));
        }
        if self.low_face == 0 || self.high_face > MAX_FACE || self.low_face > self.high_face {
            return invalid(format!(
                "face range must satisfy 1 <= low_face <= high_face <= {}: [{}, {}]",
                MAX_FACE, self.low_face, self.high_face
            ));
        }
        if self.points.triples.len() != self.num_faces() as usize {
            return invalid(format!(
                "points.triples needs one entry per face: expected {}, got {}",
                self.num_faces(),
                self.points.triples.len()
            ));
        }
        if self.farkel_limit == 0 {
            return invalid("farkel_limit must be at least 1".to_string());
        }
        if self.win_score <= 0 {
            return invalid(format!("win_score must be positive: {}", self.win_score));
        }
        if let Some((label, points)) = self
            .points
            .labeled_values()
            .find(|&(_, points)| points > MAX_PATTERN_POINTS)
        {
            return invalid(format!(
                "points.{} must be at most {}: {}",
                label, MAX_PATTERN_POINTS, points
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(6, config.num_faces());
        assert_eq!(Some(1000), config.triple_points(1));
        assert_eq!(Some(600), config.triple_points(6));
        assert_eq!(None, config.triple_points(7));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json_str(
            r#"{ "qualification_points": 300, "points": { "straight": 2000 } }"#,
        )
        .unwrap();

        assert_eq!(300, config.qualification_points);
        assert_eq!(2000, config.points.straight);
        assert_eq!(PointTable::default().triples, config.points.triples);
        assert_eq!(6, config.num_dice);
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(config, Config::from_json_str(&json).unwrap());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            Config::from_json_str(r#"{ "num_dice": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{ "high_face": 16 }"#),
            Err(ConfigError::Invalid(_))
        ));
        // eight faces but only six triple values
        assert!(matches!(
            Config::from_json_str(r#"{ "high_face": 8 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{ "farkel_limit": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{ "bogus": 1 }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_penalty_and_win_score_bounds() {
        // a negative penalty would pay out on a Farkel
        assert!(matches!(
            Config::from_json_str(r#"{ "farkel_penalty": -1000 }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{ "win_score": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{ "win_score": -10 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(
            1,
            Config::from_json_str(r#"{ "win_score": 1 }"#)
                .unwrap()
                .win_score
        );
    }

    #[test]
    fn test_point_values_are_bounded() {
        let err = Config::from_json_str(r#"{ "points": { "six_of_a_kind": 4294967295 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("points.six_of_a_kind"));

        assert!(matches!(
            Config::from_json_str(r#"{ "points": { "triples": [1000, 200, 300, 400, 500, 1000001] } }"#),
            Err(ConfigError::Invalid(_))
        ));

        let config = Config::from_json_str(r#"{ "points": { "straight": 1000000 } }"#).unwrap();
        assert_eq!(MAX_PATTERN_POINTS, config.points.straight);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_json_file("/definitely/not/a/farkel/config.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
