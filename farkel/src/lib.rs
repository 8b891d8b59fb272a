//! # farkel
//!
//! A small engine for playing the dice game Farkel : )
//!
//! ## Rules
//!
//! Each turn a player rolls six dice and must set aside ("freeze") at least one
//! scoring combination before rolling the remaining dice again. Points
//! accumulate over the turn until the player banks them. A roll with no
//! scoring dice at all is a "Farkel": the turn ends and its unbanked points are
//! lost. A player must score a qualifying amount in a single turn before any
//! points can be banked, and three consecutive Farkels cost a penalty.
//!
//! ## Layout
//!
//! The core is pure and synchronous: [`rules`] builds the table of scoring
//! patterns, [`score`] decomposes a multiset of faces against it, [`dice`]
//! holds the per-turn dice state machine and [`player`] the turn bookkeeping.
//! [`game`] and [`cli`] are the thin console layer on top.

#[macro_use]
mod macros;

mod multiset;
pub mod cli;
pub mod config;
pub mod dice;
pub mod game;
pub mod parse;
pub mod player;
pub mod rules;
pub mod score;

pub use crate::{
    config::{Config, ConfigError, PointTable},
    dice::{DiceRng, DiceSet, DiceSetError, Die, DieError, FaceCounts, RollOutcome},
    player::{Banked, Player, PlayerError, TurnRoll},
    rules::{Combo, Pattern, RuleTable, Rules},
    score::Scored,
};

///////////////
// Bit Hacks //
///////////////

/// Sum all nibbles in `x`.
#[inline]
pub(crate) fn u64_sum_all_nibs(x: u64) -> u32 {
    // a mask that selects the lo nibble in each byte.
    const NIBS_LO: u64 = 0x0f0f_0f0f_0f0f_0f0f;

    // horizontal sum hi and lo nibbles in each byte, placing in the lo nibble.
    let y = (x & NIBS_LO) + ((x >> 4) & NIBS_LO);

    // if y = [y0, y1, .., y7] bytes and each byte b is in the range 0 <= b < 32,
    // then multiplying by 0x0101_0101_0101_0101 will yield
    // z = [y0, y0 + y1, .., y0 + y1 + .. + y7] without any overflows, since the
    // largest possible sum is 8 * 30 = 240 < 256.
    let z = y.wrapping_mul(0x0101_0101_0101_0101);

    // select the last byte in z, which contains our desired sum.
    (z >> 56) as u32
}

///////////
// Tests //
///////////
