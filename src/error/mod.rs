// Error types for the rhythm engine core
//
// This module defines custom error types for waveform analysis and playback
// operations, providing structured error handling with stable error codes.
//
// Gameplay outcomes (wrong lane, wrong direction, missed target) are not errors
// and never surface here; they flow through the judgment scoring channel.

mod analysis;
mod playback;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use playback::{log_playback_error, PlaybackError, PlaybackErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI and any embedding host.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
