// TempoEstimator - robust BPM estimate from onset spacing
//
// Algorithm:
// 1. Consecutive onset intervals, sorted
// 2. Trim floor(n × trim_fraction) from each tail to drop outliers
// 3. Median of the remainder → raw BPM = 60 / median
// 4. Octave correction: try raw, raw × 2, raw × 0.5 (in that order, only
//    those inside [min_bpm, max_bpm]); the first candidate within
//    `anchor_tolerance` of a common tempo snaps to it
// 5. Otherwise fold raw into range by doubling/halving and round to a whole BPM

use serde::{Deserialize, Serialize};

use crate::config::TempoConfig;
use crate::error::AnalysisError;

/// Result of a tempo estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Final tempo, always within the configured BPM range
    pub bpm: f64,
    /// Tempo implied by the median interval before correction
    pub raw_bpm: f64,
    /// Number of onsets the estimate was built from
    pub onset_count: usize,
    /// Whether `bpm` was snapped to a common tempo anchor
    pub snapped: bool,
}

/// Estimates BPM from onset times
///
/// Estimation is a pure function of the onset list: re-running on the same
/// input yields the same BPM.
#[derive(Debug, Clone, Default)]
pub struct TempoEstimator {
    config: TempoConfig,
}

impl TempoEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TempoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    /// Estimate the tempo of a strictly increasing onset list
    ///
    /// # Arguments
    /// * `onsets` - Onset times in seconds
    ///
    /// # Returns
    /// * `Ok(TempoEstimate)` - Tempo within `[min_bpm, max_bpm]`
    /// * `Err(AnalysisError::InsufficientOnsets)` - Fewer than `min_onsets` onsets
    pub fn estimate(&self, onsets: &[f64]) -> Result<TempoEstimate, AnalysisError> {
        let required = self.config.min_onsets.max(2);
        if onsets.len() < required {
            return Err(AnalysisError::InsufficientOnsets {
                required,
                found: onsets.len(),
            });
        }

        let mut intervals: Vec<f64> = onsets
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|interval| *interval > 0.0)
            .collect();
        intervals.sort_by(|a, b| a.total_cmp(b));

        let trim = (intervals.len() as f64 * self.config.trim_fraction).floor() as usize;
        let kept = if intervals.len() > 2 * trim {
            &intervals[trim..intervals.len() - trim]
        } else {
            &intervals[..]
        };

        let median_interval = median(kept).ok_or(AnalysisError::InsufficientOnsets {
            required,
            found: onsets.len(),
        })?;
        let raw_bpm = 60.0 / median_interval;
        if !raw_bpm.is_finite() {
            return Err(AnalysisError::InvalidBpm { bpm: raw_bpm });
        }

        let (bpm, snapped) = match self.snap_to_anchor(raw_bpm) {
            Some(anchor) => (anchor, true),
            None => (self.fold_into_range(raw_bpm), false),
        };

        tracing::debug!(
            "[TempoEstimator] median interval {:.4}s, raw {:.2} BPM -> {} BPM (snapped={})",
            median_interval,
            raw_bpm,
            bpm,
            snapped
        );

        Ok(TempoEstimate {
            bpm,
            raw_bpm,
            onset_count: onsets.len(),
            snapped,
        })
    }

    /// First in-range octave candidate that lies near a common tempo
    fn snap_to_anchor(&self, raw_bpm: f64) -> Option<f64> {
        let config = &self.config;

        [raw_bpm, raw_bpm * 2.0, raw_bpm * 0.5]
            .into_iter()
            .filter(|candidate| (config.min_bpm..=config.max_bpm).contains(candidate))
            .find_map(|candidate| {
                config
                    .anchors
                    .iter()
                    .copied()
                    .min_by(|a, b| (a - candidate).abs().total_cmp(&(b - candidate).abs()))
                    .filter(|anchor| (anchor - candidate).abs() <= config.anchor_tolerance)
            })
    }

    fn fold_into_range(&self, raw_bpm: f64) -> f64 {
        let (min_bpm, max_bpm) = (self.config.min_bpm, self.config.max_bpm);
        let mut bpm = raw_bpm;

        while bpm < min_bpm && bpm > 0.0 {
            bpm *= 2.0;
        }
        while bpm > max_bpm {
            bpm /= 2.0;
        }

        bpm.round().clamp(min_bpm, max_bpm)
    }
}

/// Median of a sorted slice; mean of the two middle values for even lengths
fn median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
