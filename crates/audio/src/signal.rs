use std::path::Path;

use hound::SampleFormat;

use crate::{AudioError, Result};

/// A decoded mono recording. Immutable once loaded; the diarization pipeline
/// borrows it for the duration of a run.
#[derive(Debug, Clone)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a WAV file, averaging channels down to mono.
    pub fn from_wav_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader =
            hound::WavReader::open(path.as_ref()).map_err(|e| match e {
                hound::Error::IoError(io) => AudioError::Io(io),
                other => AudioError::Decode(other.to_string()),
            })?;
        let spec = reader.spec();
        let channels = spec.channels as usize;

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?,
            (SampleFormat::Int, 16) => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?,
            (SampleFormat::Int, 24) => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8_388_608.0))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?,
            (SampleFormat::Int, 32) => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2_147_483_648.0))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?,
            (_, bits) => return Err(AudioError::UnsupportedFormat(bits)),
        };

        let samples = if channels > 1 {
            to_mono(&interleaved, channels)
        } else {
            interleaved
        };

        tracing::debug!(
            sample_rate = spec.sample_rate,
            channels,
            samples = samples.len(),
            "decoded wav"
        );

        Ok(Self::new(samples, spec.sample_rate))
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

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

fn to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let signal = AudioSignal::new(vec![0.0; 16000], 16000);
        assert!((signal.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_mono_averages_channels() {
        let stereo = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_empty_signal() {
        let signal = AudioSignal::new(Vec::new(), 44100);
        assert!(signal.is_empty());
        assert_eq!(signal.duration_secs(), 0.0);
    }
}
