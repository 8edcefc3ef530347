// Analysis module - offline waveform analysis pipeline
//
// This module turns a decoded waveform into the beat grid that charts are
// generated on. Analysis runs once per track before play starts.
//
// Architecture:
// - Pipeline: LowPassFilter → OnsetAnalyzer → TempoEstimator → BeatGridBuilder
// - Output: AnalysisReport (onsets, tempo, beat grid)
// - Async boundary: analyze_async runs the blocking pipeline on tokio's
//   blocking pool and resolves once the report is ready

pub mod beat_grid;
pub mod filter;
pub mod onset;
pub mod spectrum;
pub mod tempo;


use serde::{Deserialize, Serialize};

use crate::audio::SampleBuffer;
use crate::config::EngineConfig;
use crate::error::{log_analysis_error, AnalysisError};

pub use beat_grid::{BeatGrid, BeatGridBuilder, GridSource, UniformGrid};
pub use filter::LowPassFilter;
pub use onset::OnsetAnalyzer;
pub use spectrum::{SpectrumAnalyzer, SpectrumSnapshot};
pub use tempo::{TempoEstimate, TempoEstimator};

/// Everything the chart generator and session need from a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Detected onset times in seconds
    pub onsets: Vec<f64>,
    /// Tempo estimate, `None` when estimation failed or no audio was analyzed
    pub tempo: Option<TempoEstimate>,
    /// Tempo the grid was built with
    pub bpm: f64,
    pub grid: BeatGrid,
    /// Track duration in seconds
    pub duration: f64,
    /// True when built without audio (uniform grid at the default tempo)
    pub degraded: bool,
}

/// Offline analysis pipeline
#[derive(Debug, Clone, Default)]
pub struct AnalysisPipeline {
    config: EngineConfig,
}

impl AnalysisPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze a waveform
    ///
    /// # Arguments
    /// * `buffer` - Decoded mono waveform
    ///
    /// # Returns
    /// * `Ok(AnalysisReport)` - Onsets, tempo and beat grid. Too few onsets
    ///   is recovered from: the default tempo and a uniform grid are used.
    /// * `Err(AnalysisError)` - Invalid filter configuration or tempo
    pub fn analyze(&self, buffer: &SampleBuffer) -> Result<AnalysisReport, AnalysisError> {
        let duration = buffer.duration_secs();
        tracing::info!(
            "[AnalysisPipeline] Analyzing {:.2}s of audio at {} Hz",
            duration,
            buffer.sample_rate()
        );

        let onsets = self.detect_onsets(buffer)?;

        let estimator = TempoEstimator::with_config(self.config.tempo.clone());
        let builder = BeatGridBuilder::with_config(self.config.beat_grid.clone());

        let (tempo, grid) = match estimator.estimate(&onsets) {
            Ok(estimate) => {
                let grid = builder.build(&onsets, estimate.bpm, duration)?;
                (Some(estimate), grid)
            }
            Err(AnalysisError::InsufficientOnsets { required, found }) => {
                tracing::warn!(
                    "[AnalysisPipeline] Only {} of {} onsets, keeping default {} BPM",
                    found,
                    required,
                    self.config.tempo.default_bpm
                );
                (None, builder.uniform(self.config.tempo.default_bpm, duration)?)
            }
            Err(err) => {
                log_analysis_error(&err, "tempo estimation");
                return Err(err);
            }
        };

        tracing::info!(
            "[AnalysisPipeline] {} onsets, {} BPM, {} beats ({:?})",
            onsets.len(),
            grid.bpm,
            grid.len(),
            grid.source
        );

        Ok(AnalysisReport {
            onsets,
            tempo,
            bpm: grid.bpm,
            grid,
            duration,
            degraded: false,
        })
    }

    /// Report for play without music
    ///
    /// Uniform grid at the default tempo over the default duration.
    pub fn without_audio(&self) -> Result<AnalysisReport, AnalysisError> {
        let bpm = self.config.tempo.default_bpm;
        let duration = self.config.beat_grid.default_duration_secs;
        let grid =
            BeatGridBuilder::with_config(self.config.beat_grid.clone()).uniform(bpm, duration)?;

        tracing::warn!(
            "[AnalysisPipeline] No audio, degraded mode: {} BPM over {}s",
            bpm,
            duration
        );

        Ok(AnalysisReport {
            onsets: Vec::new(),
            tempo: None,
            bpm,
            grid,
            duration,
            degraded: true,
        })
    }

    /// Low-pass (when enabled) and run onset detection
    pub fn detect_onsets(&self, buffer: &SampleBuffer) -> Result<Vec<f64>, AnalysisError> {
        let analyzer = OnsetAnalyzer::with_config(self.config.onset.clone());
        let filter_config = &self.config.filter;

        if !filter_config.enabled {
            return Ok(analyzer.detect(buffer));
        }

        let filter = LowPassFilter::new(
            filter_config.cutoff_hz,
            filter_config.q,
            buffer.sample_rate(),
        )?;
        let filtered = SampleBuffer::new(filter.process(buffer.samples()), buffer.sample_rate())?;
        Ok(analyzer.detect(&filtered))
    }
}

/// Run the pipeline on tokio's blocking pool
///
/// The returned future resolves exactly once, with the report or the error.
/// A panicking or cancelled worker surfaces as `AnalysisError::WorkerFailed`.
pub async fn analyze_async(
    pipeline: AnalysisPipeline,
    buffer: SampleBuffer,
) -> Result<AnalysisReport, AnalysisError> {
    tokio::task::spawn_blocking(move || pipeline.analyze(&buffer))
        .await
        .map_err(|err| AnalysisError::WorkerFailed {
            reason: err.to_string(),
        })?
}
