// Playback error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Playback error code constants
///
/// Error code range: 2001-2002
pub struct PlaybackErrorCodes {}

impl PlaybackErrorCodes {
    /// Scheduler lifecycle call made from a state that does not allow it
    pub const INVALID_TRANSITION: i32 = 2001;

    /// Chart events are not in non-decreasing time order
    pub const UNSORTED_CHART: i32 = 2002;
}

/// Log a playback error with structured context
pub fn log_playback_error(err: &PlaybackError, context: &str) {
    error!(
        "Playback error in {}: code={}, component=PlaybackScheduler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Playback lifecycle errors
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Lifecycle action not allowed from the current scheduler state
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    /// Event at `index` is earlier than its predecessor
    UnsortedChart { index: usize },
}

impl ErrorCode for PlaybackError {
    fn code(&self) -> i32 {
        match self {
            PlaybackError::InvalidTransition { .. } => PlaybackErrorCodes::INVALID_TRANSITION,
            PlaybackError::UnsortedChart { .. } => PlaybackErrorCodes::UNSORTED_CHART,
        }
    }

    fn message(&self) -> String {
        match self {
            PlaybackError::InvalidTransition { from, action } => {
                format!("Cannot {} playback while {}", action, from)
            }
            PlaybackError::UnsortedChart { index } => {
                format!("Chart event {} is earlier than the event before it", index)
            }
        }
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlaybackError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PlaybackError {}
