// Judgment module - resolving live targets against player input
//
// Wrong lanes, wrong directions and missed targets are gameplay outcomes
// reported through `Resolution`, never errors.

pub mod engine;
pub mod input;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::chart::Lane;
use crate::playback::TargetId;

pub use engine::{direction_matches, resolve_target, JudgmentEngine};
pub use input::{intent_channel, Edge, HitIntent, InstrumentPose, IntentReceiver, IntentSender};
pub use session::{multiplier_for_combo, Rank, SessionState, SessionSummary};

/// How a target was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Hit,
    Miss,
    DirectionFail,
}

/// One target leaving play with its outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub id: TargetId,
    pub event_index: usize,
    pub lane: Lane,
    pub outcome: Outcome,
    /// Points awarded; 0 for misses and direction failures
    pub points: u64,
    /// Session clock at resolution time
    pub time: f64,
}
