// LowPassFilter - second-order (biquad) low-pass pre-filter
//
// Isolates kick drum and bass energy before onset analysis. Coefficients
// follow the RBJ audio EQ cookbook low-pass form:
//
//   w0    = 2π · cutoff / sample_rate
//   alpha = sin(w0) / (2Q)
//   b0 = b2 = (1 - cos w0) / 2,  b1 = 1 - cos w0
//   a0 = 1 + alpha,  a1 = -2 cos w0,  a2 = 1 - alpha
//
// Processing uses Direct Form I in f64 to keep the recursion stable at low
// cutoff-to-rate ratios.

use crate::error::AnalysisError;

/// Biquad low-pass filter with normalized coefficients
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl LowPassFilter {
    /// Design a low-pass filter
    ///
    /// # Arguments
    /// * `cutoff_hz` - Cutoff frequency, strictly between 0 and Nyquist
    /// * `q` - Resonance (must be > 0)
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// * `Ok(LowPassFilter)` - Filter with precomputed coefficients
    /// * `Err(AnalysisError::InvalidFilter)` - Cutoff or Q out of range
    pub fn new(cutoff_hz: f32, q: f32, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate { sample_rate });
        }
        let nyquist = sample_rate as f32 / 2.0;
        if !(cutoff_hz > 0.0 && cutoff_hz < nyquist && q > 0.0) {
            return Err(AnalysisError::InvalidFilter {
                cutoff_hz,
                sample_rate,
            });
        }

        let w0 = 2.0 * std::f64::consts::PI * cutoff_hz as f64 / sample_rate as f64;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q as f64);
        let a0 = 1.0 + alpha;

        Ok(Self {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        })
    }

    /// Render the whole input through the filter from a zero state
    pub fn process(&self, input: &[f32]) -> Vec<f32> {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

        input
            .iter()
            .map(|&sample| {
                let x0 = sample as f64;
                let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
                x2 = x1;
                x1 = x0;
                y2 = y1;
                y1 = y0;
                y0 as f32
            })
            .collect()
    }
}
