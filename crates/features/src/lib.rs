//! Per-frame acoustic feature extraction for speaker discrimination.
//!
//! Slides a fixed analysis window over the voiced intervals of a recording
//! and emits one fixed-dimension vector per window: broad spectral-shape
//! descriptors plus mel-cepstral coefficients and their first and second
//! time derivatives. Cepstra carry more weight than the generic spectral
//! descriptors because they separate speakers far better.

mod cepstral;
mod spectral;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use voxsplit_vad::VoiceInterval;

/// Number of cepstral coefficients per window.
pub const N_CEPSTRA: usize = 13;
/// Mel bands feeding the cepstral transform.
pub const N_MEL_BANDS: usize = 26;
/// Broad spectral/time-domain descriptors per window.
pub const N_SPECTRAL: usize = 10;
/// Total feature dimension: descriptors + cepstra + delta + delta-delta.
pub const FEATURE_DIM: usize = N_SPECTRAL + 3 * N_CEPSTRA;

// Group weights. Cepstra dominate; raw spectral shape is kept but damped.
const SPECTRAL_WEIGHT: f32 = 0.5;
const CEPSTRAL_WEIGHT: f32 = 2.0;
const DELTA_WEIGHT: f32 = 1.5;

/// One analysis window's features, stamped with its start time in seconds.
#[derive(Debug, Clone)]
pub struct FrameFeature {
    pub time: f32,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureConfig {
    pub window_s: f32,
    pub hop_s: f32,
    /// Windows with mean-square energy below this are skipped as silence.
    pub silence_floor: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_s: 1.2,
            hop_s: 0.6,
            silence_floor: 1e-6,
        }
    }
}

pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extract one feature vector per analysis window inside the voiced
    /// intervals. Windows are only taken where they fit entirely inside an
    /// interval; near-silent windows are skipped. Output is ordered by time.
    pub fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        intervals: &[VoiceInterval],
    ) -> Vec<FrameFeature> {
        let window = (self.config.window_s * sample_rate as f32) as usize;
        let hop = (self.config.hop_s * sample_rate as f32) as usize;
        if window == 0 || hop == 0 {
            return Vec::new();
        }

        let n_fft = sub_fft_size(window);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let hann = hann_window(n_fft);
        let mel_bank = cepstral::mel_filter_bank(
            n_fft / 2 + 1,
            N_MEL_BANDS,
            sample_rate,
            0.0,
            sample_rate as f32 / 2.0,
        );

        let mut features = Vec::new();
        for interval in intervals {
            let start_idx = (interval.start * sample_rate as f32) as usize;
            let end_idx = ((interval.end * sample_rate as f32) as usize).min(samples.len());
            if start_idx >= end_idx {
                continue;
            }
            let slice = &samples[start_idx..end_idx];

            let mut pos = 0;
            while pos + window <= slice.len() {
                let frame = &slice[pos..pos + window];
                let mean_sq =
                    frame.iter().map(|&s| s as f64 * s as f64).sum::<f64>() / frame.len() as f64;
                if mean_sq >= self.config.silence_floor as f64 {
                    let time = interval.start + pos as f32 / sample_rate as f32;
                    let values =
                        window_features(frame, sample_rate, &fft, &hann, &mel_bank, n_fft);
                    features.push(FrameFeature { time, values });
                }
                pos += hop;
            }
        }

        tracing::debug!(frames = features.len(), dim = FEATURE_DIM, "features extracted");
        features
    }
}

/// Compute the full feature vector for one window. Numerical edge cases are
/// absorbed by `sanitize`; this function never fails.
fn window_features(
    frame: &[f32],
    sample_rate: u32,
    fft: &Arc<dyn Fft<f32>>,
    hann: &[f32],
    mel_bank: &[Vec<f32>],
    n_fft: usize,
) -> Vec<f32> {
    let spectrum = mean_magnitude_spectrum(frame, fft, hann, n_fft);
    let descriptors = spectral::descriptors(frame, &spectrum, sample_rate);

    let cepstra = cepstral::cepstral_trajectory(frame, fft, hann, mel_bank, n_fft);
    let (mfcc, delta, delta2) = cepstral::pool_with_deltas(&cepstra);

    let mut values = Vec::with_capacity(FEATURE_DIM);
    values.extend(descriptors.iter().map(|&v| v * SPECTRAL_WEIGHT));
    values.extend(mfcc.iter().map(|&v| v * CEPSTRAL_WEIGHT));
    values.extend(delta.iter().map(|&v| v * DELTA_WEIGHT));
    values.extend(delta2.iter().map(|&v| v * DELTA_WEIGHT));

    sanitize(&mut values);
    debug_assert_eq!(values.len(), FEATURE_DIM);
    values
}

/// Average magnitude spectrum over half-overlapping sub-frames of the window.
fn mean_magnitude_spectrum(
    frame: &[f32],
    fft: &Arc<dyn Fft<f32>>,
    hann: &[f32],
    n_fft: usize,
) -> Vec<f32> {
    let n_bins = n_fft / 2 + 1;
    let mut acc = vec![0.0f32; n_bins];
    let mut count = 0usize;
    let mut buf: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); n_fft];

    let hop = n_fft / 2;
    let mut pos = 0;
    while pos + n_fft <= frame.len() {
        for (b, (&s, &w)) in buf.iter_mut().zip(frame[pos..].iter().zip(hann.iter())) {
            *b = Complex::new(s * w, 0.0);
        }
        fft.process(&mut buf);
        for (a, c) in acc.iter_mut().zip(buf.iter().take(n_bins)) {
            *a += c.norm();
        }
        count += 1;
        pos += hop;
    }

    if count > 0 {
        for a in &mut acc {
            *a /= count as f32;
        }
    }
    acc
}

/// Replace NaN with 0, positive infinity with 1, negative infinity with 0.
pub fn sanitize(values: &mut [f32]) {
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = 0.0;
        } else if *v == f32::INFINITY {
            *v = 1.0;
        } else if *v == f32::NEG_INFINITY {
            *v = 0.0;
        }
    }
}

/// Standardize each dimension to zero mean and unit variance across the whole
/// run. Must be applied once, after all frames have been collected, so the
/// scaling is global to the recording.
pub fn standardize(features: &mut [FrameFeature]) {
    if features.is_empty() {
        return;
    }
    let dim = features[0].values.len();
    let n = features.len() as f64;

    for d in 0..dim {
        let mean = features.iter().map(|f| f.values[d] as f64).sum::<f64>() / n;
        let var = features
            .iter()
            .map(|f| {
                let diff = f.values[d] as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        let std = var.sqrt().max(1e-8);
        for f in features.iter_mut() {
            f.values[d] = ((f.values[d] as f64 - mean) / std) as f32;
        }
    }
}

/// Largest power of two that fits the window, capped at 2048.
fn sub_fft_size(window: usize) -> usize {
    let mut n = 32;
    while n * 2 <= window && n < 2048 {
        n *= 2;
    }
    n
}

fn hann_window(n: usize) -> Vec<f32> {
    let n_f = n as f32;
    (0..n)
        .map(|i| 0.5 - 0.5 * ((2.0 * std::f32::consts::PI * i as f32) / n_f).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, secs: f32, sr: u32) -> Vec<f32> {
        (0..(secs * sr as f32) as usize)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin() * 0.5)
            .collect()
    }

    fn whole(secs: f32) -> Vec<VoiceInterval> {
        vec![VoiceInterval {
            start: 0.0,
            end: secs,
        }]
    }

    #[test]
    fn test_feature_dimension() {
        let sr = 16000;
        let samples = tone(440.0, 3.0, sr);
        let extractor = FeatureExtractor::new(FeatureConfig::default());
        let features = extractor.extract(&samples, sr, &whole(3.0));
        assert!(!features.is_empty());
        for f in &features {
            assert_eq!(f.values.len(), FEATURE_DIM);
        }
    }

    #[test]
    fn test_silent_windows_skipped() {
        let sr = 16000;
        let samples = vec![0.0f32; sr as usize * 3];
        let extractor = FeatureExtractor::new(FeatureConfig::default());
        let features = extractor.extract(&samples, sr, &whole(3.0));
        assert!(features.is_empty());
    }

    #[test]
    fn test_timestamps_increase() {
        let sr = 16000;
        let samples = tone(300.0, 4.0, sr);
        let extractor = FeatureExtractor::new(FeatureConfig::default());
        let features = extractor.extract(&samples, sr, &whole(4.0));
        for pair in features.windows(2) {
            assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn test_distinct_tones_give_distinct_features() {
        let sr = 16000;
        let low = tone(200.0, 2.0, sr);
        let high = tone(2000.0, 2.0, sr);
        let extractor = FeatureExtractor::new(FeatureConfig::default());
        let f_low = extractor.extract(&low, sr, &whole(2.0));
        let f_high = extractor.extract(&high, sr, &whole(2.0));
        assert!(!f_low.is_empty() && !f_high.is_empty());

        let dist: f32 = f_low[0]
            .values
            .iter()
            .zip(&f_high[0].values)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt();
        assert!(dist > 1.0, "tones an octave apart should separate, got {dist}");
    }

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let mut values = vec![f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.25];
        sanitize(&mut values);
        assert_eq!(values, vec![0.0, 1.0, 0.0, 0.25]);
    }

    #[test]
    fn test_standardize_is_global() {
        let mut features = vec![
            FrameFeature {
                time: 0.0,
                values: vec![1.0, 10.0],
            },
            FrameFeature {
                time: 0.6,
                values: vec![3.0, 30.0],
            },
        ];
        standardize(&mut features);
        for d in 0..2 {
            let mean: f32 = features.iter().map(|f| f.values[d]).sum::<f32>() / 2.0;
            assert!(mean.abs() < 1e-5);
            assert!((features[0].values[d] + 1.0).abs() < 1e-4);
            assert!((features[1].values[d] - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_standardize_constant_dimension_stays_finite() {
        let mut features = vec![
            FrameFeature {
                time: 0.0,
                values: vec![5.0],
            },
            FrameFeature {
                time: 0.6,
                values: vec![5.0],
            },
        ];
        standardize(&mut features);
        assert!(features.iter().all(|f| f.values[0].is_finite()));
    }
}
