// WAV collaborator - decode/encode waveforms for the CLI and fixtures

use std::path::Path;

use super::buffer::SampleBuffer;
use crate::error::AnalysisError;

/// Decode a WAV file into a downmixed mono buffer
///
/// Integer formats are scaled by their bit depth into [-1.0, 1.0]; float
/// formats are taken as-is.
///
/// # Arguments
/// * `path` - WAV file to read
///
/// # Returns
/// * `Ok(SampleBuffer)` - Mono samples at the file's sample rate
/// * `Err(AnalysisError::DecodeFailed)` - Unreadable file or unsupported format
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer, AnalysisError> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path).map_err(|err| AnalysisError::DecodeFailed {
        reason: format!("failed to open {}: {err}", path.display()),
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AnalysisError::DecodeFailed {
            reason: format!("{} has zero channels", path.display()),
        });
    }

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            8 | 16 | 24 | 32 => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<f32>, _>>()?
            }
            bits => {
                return Err(AnalysisError::DecodeFailed {
                    reason: format!(
                        "unsupported bits_per_sample={} for {}",
                        bits,
                        path.display()
                    ),
                })
            }
        },
    };

    tracing::debug!(
        "[Wav] Decoded {} ({} Hz, {} ch, {} frames)",
        path.display(),
        spec.sample_rate,
        spec.channels,
        interleaved.len() / spec.channels as usize
    );

    SampleBuffer::from_interleaved(&interleaved, spec.channels, spec.sample_rate)
}

/// Encode a buffer as a mono 32-bit float WAV file
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &SampleBuffer) -> Result<(), AnalysisError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in buffer.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
