// OnsetAnalyzer - energy-based onset detection with a trailing adaptive baseline
//
// Percussive attacks show up as sudden jumps in short-time energy. The
// analyzer compares each window against a short history ending at itself.
//
// Algorithm:
// 1. Slide a window of W samples with hop H across the (low-passed) signal
// 2. Compute RMS energy per window
// 3. Baseline = mean and stddev of the last N window energies, current one included
// 4. Flag an onset when the history is full AND
//    energy > ratio × mean AND energy > mean + k × stddev
// 5. Refractory: drop candidates not strictly later than previous + min_spacing
//
// Onset time is the window start sample divided by the sample rate.

use crate::audio::SampleBuffer;
use crate::config::OnsetConfig;

/// OnsetAnalyzer turns a waveform into a list of onset times in seconds
#[derive(Debug, Clone, Default)]
pub struct OnsetAnalyzer {
    config: OnsetConfig,
}

impl OnsetAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with explicit configuration parameters
    pub fn with_config(config: OnsetConfig) -> Self {
        let config = OnsetConfig {
            window_size: config.window_size.max(1),
            hop_size: config.hop_size.max(1),
            history_len: config.history_len.max(1),
            ..config
        };
        Self { config }
    }

    pub fn config(&self) -> &OnsetConfig {
        &self.config
    }

    /// Detect onsets in a buffer
    ///
    /// # Arguments
    /// * `buffer` - Mono waveform, usually already low-pass filtered
    ///
    /// # Returns
    /// Strictly increasing onset times in seconds; consecutive onsets are more
    /// than `min_spacing_secs` apart. Empty for silent or too-short input.
    pub fn detect(&self, buffer: &SampleBuffer) -> Vec<f64> {
        let energies = self.window_energies(buffer.samples());
        let sample_rate = buffer.sample_rate() as f64;
        let history_len = self.config.history_len;

        let mut onsets: Vec<f64> = Vec::new();

        // The first candidate is the window that fills the history
        for (index, &energy) in energies.iter().enumerate().skip(history_len - 1) {
            let (mean, stddev) = mean_and_stddev(&energies[index + 1 - history_len..=index]);

            let above_ratio = energy > self.config.threshold_ratio * mean;
            let above_spread = energy > mean + self.config.stddev_factor * stddev;
            if !(above_ratio && above_spread) {
                continue;
            }

            let time = (index * self.config.hop_size) as f64 / sample_rate;
            if let Some(&last) = onsets.last() {
                if time - last <= self.config.min_spacing_secs {
                    continue;
                }
            }
            onsets.push(time);
        }

        tracing::debug!(
            "[OnsetAnalyzer] {} windows, {} onsets",
            energies.len(),
            onsets.len()
        );

        onsets
    }

    /// RMS energy for every full window
    pub fn window_energies(&self, samples: &[f32]) -> Vec<f32> {
        let window_size = self.config.window_size;
        if samples.len() < window_size {
            return Vec::new();
        }

        samples
            .windows(window_size)
            .step_by(self.config.hop_size)
            .map(rms)
            .collect()
    }
}

/// Root mean square of a window
fn rms(window: &[f32]) -> f32 {
    let sum_sq: f32 = window.iter().map(|s| s * s).sum();
    (sum_sq / window.len() as f32).sqrt()
}

/// Population mean and standard deviation
fn mean_and_stddev(values: &[f32]) -> (f32, f32) {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, variance.sqrt())
}
