// SampleBuffer - immutable mono PCM waveform handed to the analysis pipeline

use crate::error::AnalysisError;

/// Decoded mono waveform plus its sample rate
///
/// The buffer is read-only after construction; analysis stages borrow the
/// samples and never mutate them in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap mono samples
    ///
    /// # Arguments
    /// * `samples` - Mono PCM samples, nominally in [-1.0, 1.0]
    /// * `sample_rate` - Sample rate in Hz (must be > 0)
    ///
    /// # Returns
    /// * `Ok(SampleBuffer)` - Buffer ready for analysis
    /// * `Err(AnalysisError::InvalidSampleRate)` - If `sample_rate == 0`
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate { sample_rate });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Build a mono buffer from interleaved multi-channel samples
    ///
    /// Each output frame is the arithmetic mean of its channels. A trailing
    /// partial frame is dropped.
    pub fn from_interleaved(
        interleaved: &[f32],
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        let channels = channels.max(1) as usize;
        if channels == 1 {
            return Self::new(interleaved.to_vec(), sample_rate);
        }

        let mono = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self::new(mono, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Track duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Consume the buffer, returning the raw samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sample_rate_rejected() {
        let result = SampleBuffer::new(vec![0.0; 16], 0);
        assert_eq!(
            result,
            Err(AnalysisError::InvalidSampleRate { sample_rate: 0 })
        );
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 22050], 44100).unwrap();
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-12);
        assert_eq!(buffer.len(), 22050);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_downmix_stereo() {
        let interleaved = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0, 0.25];
        let buffer = SampleBuffer::from_interleaved(&interleaved, 2, 48000).unwrap();

        // Trailing half frame dropped
        assert_eq!(buffer.samples(), &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mono_passthrough() {
        let buffer = SampleBuffer::from_interleaved(&[0.1, 0.2], 1, 8000).unwrap();
        assert_eq!(buffer.samples(), &[0.1, 0.2]);
        assert_eq!(buffer.into_samples(), vec![0.1, 0.2]);
    }
}
