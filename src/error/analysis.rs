// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Single source of truth for the numeric codes reported by the CLI and by
/// hosts embedding the engine.
///
/// Error code range: 1001-1006
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Sample rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 1001;

    /// BPM is not a positive finite number
    pub const INVALID_BPM: i32 = 1002;

    /// Too few onsets for a statistically meaningful tempo estimate
    pub const INSUFFICIENT_ONSETS: i32 = 1003;

    /// Low-pass cutoff outside (0, nyquist)
    pub const INVALID_FILTER: i32 = 1004;

    /// Audio collaborator could not decode or encode a waveform
    pub const DECODE_FAILED: i32 = 1005;

    /// Background analysis task panicked or was cancelled
    pub const WORKER_FAILED: i32 = 1006;
}

/// Log an analysis error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=AnalysisPipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Waveform analysis errors
///
/// Covers the offline pipeline from decoded samples to the beat grid.
/// `InsufficientOnsets` is non-fatal: the pipeline recovers by keeping the
/// default tempo.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Sample rate must be greater than zero
    InvalidSampleRate { sample_rate: u32 },

    /// BPM must be positive and finite
    InvalidBpm { bpm: f64 },

    /// Tempo estimation needs more onsets
    InsufficientOnsets { required: usize, found: usize },

    /// Filter cutoff must lie strictly between 0 Hz and the Nyquist frequency
    InvalidFilter { cutoff_hz: f32, sample_rate: u32 },

    /// WAV decode/encode failure
    DecodeFailed { reason: String },

    /// Blocking analysis task did not complete
    WorkerFailed { reason: String },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidSampleRate { .. } => AnalysisErrorCodes::INVALID_SAMPLE_RATE,
            AnalysisError::InvalidBpm { .. } => AnalysisErrorCodes::INVALID_BPM,
            AnalysisError::InsufficientOnsets { .. } => AnalysisErrorCodes::INSUFFICIENT_ONSETS,
            AnalysisError::InvalidFilter { .. } => AnalysisErrorCodes::INVALID_FILTER,
            AnalysisError::DecodeFailed { .. } => AnalysisErrorCodes::DECODE_FAILED,
            AnalysisError::WorkerFailed { .. } => AnalysisErrorCodes::WORKER_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            AnalysisError::InvalidBpm { bpm } => {
                format!("BPM must be positive and finite (got {})", bpm)
            }
            AnalysisError::InsufficientOnsets { required, found } => {
                format!(
                    "Insufficient onsets for tempo estimation: need {}, got {}",
                    required, found
                )
            }
            AnalysisError::InvalidFilter {
                cutoff_hz,
                sample_rate,
            } => {
                format!(
                    "Low-pass cutoff {} Hz is invalid for sample rate {} Hz",
                    cutoff_hz, sample_rate
                )
            }
            AnalysisError::DecodeFailed { reason } => {
                format!("Failed to decode audio: {}", reason)
            }
            AnalysisError::WorkerFailed { reason } => {
                format!("Analysis worker failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}

/// Convert from hound::Error to AnalysisError
impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        AnalysisError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}

/// Convert from std::io::Error to AnalysisError
impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}
