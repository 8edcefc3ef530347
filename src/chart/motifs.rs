//! Per-tier motif tables
//!
//! A motif is a short pattern of notes placed relative to the first beat of
//! a block. Tables are plain `const` data selected by `match` on the tier.

use super::Color::{Blue, Red};
use super::Direction as D;
use super::{Color, Difficulty, Direction};

/// One note of a motif
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotifNote {
    /// Beat offset from the start of the block
    pub offset: usize,
    pub color: Color,
    pub direction: Direction,
}

pub type Motif = &'static [MotifNote];

const fn note(offset: usize, color: Color, direction: Direction) -> MotifNote {
    MotifNote {
        offset,
        color,
        direction,
    }
}

/// One note per block, alternating colors
pub const BEGINNER: [Motif; 2] = [&[note(0, Red, D::None)], &[note(0, Blue, D::None)]];

/// Two- and three-note color patterns on every other beat
pub const NORMAL: [Motif; 6] = [
    &[note(0, Red, D::None), note(2, Blue, D::None)],
    &[note(0, Blue, D::None), note(2, Red, D::None)],
    &[note(0, Red, D::None), note(2, Red, D::None)],
    &[note(0, Blue, D::None), note(2, Blue, D::None)],
    &[
        note(0, Blue, D::None),
        note(2, Red, D::None),
        note(4, Blue, D::None),
    ],
    &[
        note(0, Red, D::None),
        note(2, Blue, D::None),
        note(4, Red, D::None),
    ],
];

/// Three notes with cardinal directions
pub const EXPERT: [Motif; 6] = [
    &[note(0, Red, D::Down), note(2, Blue, D::Up), note(4, Red, D::Left)],
    &[note(0, Blue, D::Up), note(2, Red, D::Down), note(4, Blue, D::Right)],
    &[note(0, Red, D::Left), note(2, Red, D::Right), note(4, Blue, D::Up)],
    &[note(0, Blue, D::Right), note(2, Blue, D::Left), note(4, Red, D::Down)],
    &[note(0, Red, D::Down), note(2, Blue, D::Right), note(4, Blue, D::Left)],
    &[note(0, Blue, D::Up), note(2, Red, D::Left), note(4, Red, D::Right)],
];

/// Three tightly spaced notes mixing cardinal and diagonal directions
pub const EXPERT_PLUS: [Motif; 6] = [
    &[
        note(0, Red, D::UpLeft),
        note(2, Blue, D::UpRight),
        note(3, Red, D::DownLeft),
    ],
    &[note(0, Blue, D::Up), note(2, Blue, D::Left), note(3, Red, D::Right)],
    &[note(0, Red, D::Down), note(2, Red, D::Right), note(3, Blue, D::Left)],
    &[
        note(0, Blue, D::DownRight),
        note(2, Red, D::DownLeft),
        note(3, Blue, D::UpRight),
    ],
    &[note(0, Red, D::Up), note(2, Blue, D::Down), note(3, Red, D::Left)],
    &[
        note(0, Blue, D::Right),
        note(2, Red, D::UpRight),
        note(3, Blue, D::DownLeft),
    ],
];

/// Motif table for a tier
pub fn motifs(difficulty: Difficulty) -> &'static [Motif] {
    match difficulty {
        Difficulty::Beginner => &BEGINNER,
        Difficulty::Normal => &NORMAL,
        Difficulty::Expert => &EXPERT,
        Difficulty::ExpertPlus => &EXPERT_PLUS,
    }
}
