//! Click track - deterministic percussive fixtures on a BPM grid
//!
//! Synthesizes test and demo waveforms whose beat positions are known
//! exactly. Key features:
//! - 20ms white noise burst clicks from a fixed seed (identical every call)
//! - Beat positions computed as `offset + i * interval`, rounded once to the
//!   nearest sample (no accumulated drift)
//! - Pure functions (no side effects, deterministic output)

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::buffer::SampleBuffer;
use crate::error::AnalysisError;

/// Duration of a click in milliseconds
const CLICK_DURATION_MS: f32 = 20.0;

/// Seed shared by every click so all beats carry the same burst
const CLICK_SEED: u64 = 42;

/// Generates a click sample (20ms white noise burst).
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
///
/// # Returns
/// A `Vec<f32>` containing exactly 20ms worth of white noise samples in range [-1.0, 1.0]
pub fn generate_click_sample(sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * CLICK_DURATION_MS / 1000.0) as usize;
    let mut rng = StdRng::seed_from_u64(CLICK_SEED);

    (0..num_samples).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Converts BPM to (fractional) samples per beat.
///
/// Formula: samples_per_beat = (sample_rate × 60) / BPM
#[inline]
pub fn samples_per_beat(bpm: f64, sample_rate: u32) -> f64 {
    sample_rate as f64 * 60.0 / bpm
}

/// Parameters for a rendered click track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickTrack {
    pub bpm: f64,
    pub duration_secs: f64,
    /// Time of the first click in seconds
    pub offset_secs: f64,
    /// Peak amplitude of each click
    pub amplitude: f32,
}

impl ClickTrack {
    pub fn new(bpm: f64, duration_secs: f64) -> Self {
        Self {
            bpm,
            duration_secs,
            offset_secs: 0.0,
            amplitude: 0.8,
        }
    }

    pub fn with_offset(mut self, offset_secs: f64) -> Self {
        self.offset_secs = offset_secs;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Click times in seconds, strictly below the track duration
    pub fn beat_times(&self) -> Vec<f64> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Vec::new();
        }
        let interval = 60.0 / self.bpm;
        (0..)
            .map(|i| self.offset_secs + i as f64 * interval)
            .take_while(|&t| t < self.duration_secs)
            .collect()
    }

    /// Render the track to a mono buffer
    ///
    /// # Returns
    /// * `Ok(SampleBuffer)` - Silence with a click at every beat time
    /// * `Err(AnalysisError::InvalidBpm)` - If BPM is not positive and finite
    /// * `Err(AnalysisError::InvalidSampleRate)` - If `sample_rate == 0`
    pub fn render(&self, sample_rate: u32) -> Result<SampleBuffer, AnalysisError> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(AnalysisError::InvalidBpm { bpm: self.bpm });
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate { sample_rate });
        }

        let total_samples = (self.duration_secs.max(0.0) * sample_rate as f64) as usize;
        let mut samples = vec![0.0f32; total_samples];
        let click = generate_click_sample(sample_rate);

        let beat_samples = samples_per_beat(self.bpm, sample_rate);
        let offset_samples = self.offset_secs * sample_rate as f64;
        for beat in 0..self.beat_times().len() {
            let start = (offset_samples + beat as f64 * beat_samples).round() as usize;
            for (offset, &value) in click.iter().enumerate() {
                match samples.get_mut(start + offset) {
                    Some(slot) => *slot += value * self.amplitude,
                    None => break,
                }
            }
        }

        SampleBuffer::new(samples, sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_click_sample_duration() {
        for &sr in &[44100, 48000, 96000] {
            let click = generate_click_sample(sr);
            let expected_samples = (sr as f32 * CLICK_DURATION_MS / 1000.0) as usize;
            assert_eq!(
                click.len(),
                expected_samples,
                "Click duration should be exactly 20ms at {} Hz",
                sr
            );
        }
    }

    #[test]
    fn test_generate_click_sample_deterministic() {
        let click1 = generate_click_sample(48000);
        let click2 = generate_click_sample(48000);
        assert_eq!(click1, click2);
        assert!(click1.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_samples_per_beat_formula() {
        assert_eq!(samples_per_beat(120.0, 48000), 24000.0);
        assert_eq!(samples_per_beat(60.0, 48000), 48000.0);
        assert_eq!(samples_per_beat(100.0, 44100), 26460.0);
    }

    #[test]
    fn test_beat_times_no_drift() {
        let track = ClickTrack::new(120.0, 30.0).with_offset(0.25);
        let beats = track.beat_times();

        assert_eq!(beats.len(), 60);
        assert_eq!(beats[0], 0.25);
        // Computed by multiplication, not accumulation
        assert_eq!(beats[59], 0.25 + 59.0 * 0.5);
        assert!(beats.iter().all(|&t| t < 30.0));
    }

    #[test]
    fn test_render_places_clicks() {
        let track = ClickTrack::new(60.0, 3.0).with_amplitude(1.0);
        let buffer = track.render(8000).unwrap();

        assert_eq!(buffer.len(), 24000);
        let click = generate_click_sample(8000);
        assert_eq!(&buffer.samples()[8000..8000 + click.len()], click.as_slice());
        // Silence between clicks
        assert!(buffer.samples()[4000..7999].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_rejects_invalid_bpm() {
        let result = ClickTrack::new(0.0, 1.0).render(44100);
        assert_eq!(result, Err(AnalysisError::InvalidBpm { bpm: 0.0 }));
    }
}
