//! Parsers for the die lists players type in: `[0, 2]`, `0 2`, and `0,2` are
//! all the same selection.

use crate::{config::Config, dice::FaceCounts};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const SPLITTERS: &[char] = &[',', ' ', '\n', '\t'];

/// Split a bracketed or bare list into its non-empty items.
fn list_items(s: &str) -> impl Iterator<Item = &str> {
    let s = s.trim();
    let s = s.trim_start_matches('[');
    let s = s.trim_end_matches(']');

    s.split(SPLITTERS).filter(|item| !item.is_empty())
}

///////////////
// Selection //
///////////////

/// Die indices to freeze.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(pub Vec<usize>);

impl FromStr for Selection {
    type Err = String;

    // [0, 2, 3]

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let indices = list_items(s)
            .map(|item| {
                item.parse::<usize>()
                    .map_err(|err| format!("failed to parse die index: '{}', error: {}", item, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if indices.is_empty() {
            return Err("select at least one die".to_string());
        }

        Ok(Self(indices))
    }
}

impl IntoIterator for Selection {
    type Item = usize;
    type IntoIter = std::vec::IntoIter<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

//////////////
// FaceList //
//////////////

/// A list of rolled faces, as typed. Range checks need a [`Config`], so they
/// happen in [`FaceList::to_counts`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceList(pub Vec<u8>);

impl FaceList {
    pub fn to_counts(&self, config: &Config) -> Result<FaceCounts, String> {
        if let Some(face) = self.0.iter().find(|&&face| !config.faces().contains(&face)) {
            return Err(format!(
                "die face needs to be in the range [{},{}]: '{}'",
                config.low_face, config.high_face, face
            ));
        }

        let ndice = self.0.len();
        if ndice > config.num_dice as usize {
            return Err(format!(
                "too many dice: there are only {} dice, got {}",
                config.num_dice, ndice
            ));
        }

        Ok(FaceCounts::from_faces(&self.0))
    }
}

impl FromStr for FaceList {
    type Err = String;

    // [1, 1, 5, 2]

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let faces = list_items(s)
            .map(|item| {
                item.parse::<u8>()
                    .map_err(|err| format!("failed to parse die face: '{}', error: {}", item, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(faces))
    }
}

impl fmt::Display for FaceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", itertools::join(&self.0, ", "))
    }
}

///////////
// Tests //
///////////
