// BeatGridBuilder - beat positions from tempo plus (optionally) detected onsets
//
// Without onsets the grid is uniform from zero. With onsets the grid is
// anchored at the first onset and each synthetic point is pulled onto the
// closest unused onset inside the match window, so charted notes land on
// real transients rather than an idealized metronome.

use serde::{Deserialize, Serialize};

use crate::config::BeatGridConfig;
use crate::error::AnalysisError;

/// How a beat grid was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridSource {
    Uniform,
    OnsetAligned,
}

/// Strictly increasing beat times within `[first_beat, duration)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatGrid {
    pub beats: Vec<f64>,
    pub bpm: f64,
    pub duration: f64,
    pub source: GridSource,
}

impl BeatGrid {
    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Seconds per beat
    pub fn interval(&self) -> f64 {
        60.0 / self.bpm
    }
}

/// Restartable iterator over `start + i × interval` while below `end`
///
/// Each point is computed from its index, so long tracks accumulate no
/// floating point drift.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    start: f64,
    interval: f64,
    end: f64,
    index: u64,
}

impl UniformGrid {
    /// # Arguments
    /// * `start` - Time of the first point in seconds
    /// * `interval` - Seconds between points (must be positive and finite)
    /// * `end` - Exclusive upper bound
    pub fn new(start: f64, interval: f64, end: f64) -> Self {
        Self {
            start,
            interval,
            end,
            index: 0,
        }
    }

    /// Rewind to the first point
    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for UniformGrid {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return None;
        }
        let point = self.start + self.index as f64 * self.interval;
        if point < self.end {
            self.index += 1;
            Some(point)
        } else {
            None
        }
    }
}

/// Builds beat grids from a tempo, a duration and optional onsets
#[derive(Debug, Clone, Default)]
pub struct BeatGridBuilder {
    config: BeatGridConfig,
}

impl BeatGridBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BeatGridConfig) -> Self {
        Self { config }
    }

    /// Uniform grid from zero
    ///
    /// # Returns
    /// * `Ok(BeatGrid)` - Beats at `i × 60/bpm` below `duration`
    /// * `Err(AnalysisError::InvalidBpm)` - If `bpm` is not positive and finite
    pub fn uniform(&self, bpm: f64, duration: f64) -> Result<BeatGrid, AnalysisError> {
        validate_bpm(bpm)?;
        let beats = UniformGrid::new(0.0, 60.0 / bpm, duration).collect();

        Ok(BeatGrid {
            beats,
            bpm,
            duration,
            source: GridSource::Uniform,
        })
    }

    /// Build a grid, aligning to onsets when any are present
    ///
    /// # Arguments
    /// * `onsets` - Strictly increasing onset times in seconds (may be empty)
    /// * `bpm` - Tempo in beats per minute
    /// * `duration` - Track duration in seconds
    ///
    /// # Returns
    /// * `Ok(BeatGrid)` - Strictly increasing beats within `[first_beat, duration)`
    /// * `Err(AnalysisError::InvalidBpm)` - If `bpm` is not positive and finite
    pub fn build(
        &self,
        onsets: &[f64],
        bpm: f64,
        duration: f64,
    ) -> Result<BeatGrid, AnalysisError> {
        validate_bpm(bpm)?;
        let Some(&first) = onsets.first() else {
            return self.uniform(bpm, duration);
        };

        let window = self.config.match_window_secs;
        let mut used = vec![false; onsets.len()];
        // Onsets before this index are too early for any remaining grid point
        let mut cursor = 0usize;
        let mut beats: Vec<f64> = Vec::new();
        let mut aligned = 0usize;

        for point in UniformGrid::new(first, 60.0 / bpm, duration) {
            while cursor < onsets.len() && onsets[cursor] < point - window {
                cursor += 1;
            }

            let candidate = onsets[cursor..]
                .iter()
                .enumerate()
                .take_while(|&(_, &onset)| onset <= point + window)
                .filter(|&(offset, _)| !used[cursor + offset])
                .min_by(|&(_, a), &(_, b)| (a - point).abs().total_cmp(&(b - point).abs()))
                .map(|(offset, &onset)| (cursor + offset, onset));

            let last = beats.last().copied();
            let is_ascending = |time: f64| last.map_or(true, |prev| time > prev);

            match candidate {
                Some((index, onset)) if is_ascending(onset) && onset < duration => {
                    used[index] = true;
                    aligned += 1;
                    beats.push(onset);
                }
                _ if is_ascending(point) => beats.push(point),
                _ => {}
            }
        }

        tracing::debug!(
            "[BeatGrid] {} beats at {} BPM, {} aligned to onsets",
            beats.len(),
            bpm,
            aligned
        );

        Ok(BeatGrid {
            beats,
            bpm,
            duration,
            source: GridSource::OnsetAligned,
        })
    }
}

fn validate_bpm(bpm: f64) -> Result<(), AnalysisError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidBpm { bpm })
    }
}
