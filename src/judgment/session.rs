// SessionState - score, combo and accuracy bookkeeping
//
// Mutated only through the judgment engine. The multiplier is derived from
// the combo on demand and is never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Points for a hit at multiplier 1
pub const BASE_POINTS: u64 = 100;

/// Points removed for a miss or direction failure
pub const MISS_PENALTY: u64 = 10;

/// Multiplier step function of the current combo
///
/// 1× below 10, 2× for 10–24, 3× for 25–49, 4× from 50.
pub fn multiplier_for_combo(combo: u32) -> u32 {
    match combo {
        0..=9 => 1,
        10..=24 => 2,
        25..=49 => 3,
        _ => 4,
    }
}

/// Running session score state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    score: u64,
    combo: u32,
    max_combo: u32,
    hits: u32,
    misses: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn multiplier(&self) -> u32 {
        multiplier_for_combo(self.combo)
    }

    /// Award a hit
    ///
    /// Points use the multiplier in effect before the combo increments.
    ///
    /// # Returns
    /// Points awarded
    pub(crate) fn register_hit(&mut self) -> u64 {
        let points = BASE_POINTS * self.multiplier() as u64;
        self.score += points;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.hits += 1;
        points
    }

    /// Apply the miss penalty (score floors at zero) and break the combo
    pub(crate) fn register_miss(&mut self) {
        self.score = self.score.saturating_sub(MISS_PENALTY);
        self.combo = 0;
        self.misses += 1;
    }

    /// Clear everything for a restart
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// hits / (hits + misses), 1.0 before anything was judged
    pub fn accuracy(&self) -> f64 {
        let judged = self.hits + self.misses;
        if judged == 0 {
            1.0
        } else {
            self.hits as f64 / judged as f64
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let accuracy = self.accuracy();
        let accuracy_percent = (accuracy * 100.0).round() as u32;

        SessionSummary {
            score: self.score,
            hits: self.hits,
            misses: self.misses,
            max_combo: self.max_combo,
            accuracy,
            accuracy_percent,
            rank: Rank::from_result(accuracy_percent, self.score),
        }
    }
}

/// Letter rank of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    SS,
    S,
    A,
    B,
    C,
    D,
}

impl Rank {
    /// Score a session needs (beyond 95% accuracy) for SS
    pub const SS_SCORE: u64 = 50_000;

    pub fn from_result(accuracy_percent: u32, score: u64) -> Self {
        if accuracy_percent >= 95 && score > Self::SS_SCORE {
            Rank::SS
        } else if accuracy_percent >= 90 {
            Rank::S
        } else if accuracy_percent >= 80 {
            Rank::A
        } else if accuracy_percent >= 70 {
            Rank::B
        } else if accuracy_percent >= 60 {
            Rank::C
        } else {
            Rank::D
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Terminal session result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    pub max_combo: u32,
    /// hits / (hits + misses)
    pub accuracy: f64,
    /// Accuracy as a rounded percentage
    pub accuracy_percent: u32,
    pub rank: Rank,
}
