//! Broad spectral-shape and time-domain descriptors for one window.

use crate::N_SPECTRAL;

const EPS: f32 = 1e-10;

const PITCH_MIN_HZ: f32 = 80.0;
const PITCH_MAX_HZ: f32 = 400.0;
const LOW_BAND_HZ: f32 = 1000.0;
const HIGH_BAND_HZ: f32 = 4000.0;

/// Ten descriptors from a window and its averaged magnitude spectrum:
/// centroid, rolloff, bandwidth, flatness, slope, low/high band ratios,
/// zero-crossing rate, RMS, and an autocorrelation pitch estimate.
pub(crate) fn descriptors(frame: &[f32], spectrum: &[f32], sample_rate: u32) -> [f32; N_SPECTRAL] {
    let nyquist = sample_rate as f32 / 2.0;
    let n_bins = spectrum.len();
    let bin_hz = if n_bins > 1 {
        nyquist / (n_bins - 1) as f32
    } else {
        nyquist
    };

    let total: f32 = spectrum.iter().sum();

    // Weighted mean frequency.
    let centroid = if total > 0.0 {
        spectrum
            .iter()
            .enumerate()
            .map(|(i, &m)| i as f32 * bin_hz * m)
            .sum::<f32>()
            / total
    } else {
        0.0
    };

    // Frequency below which 85% of the magnitude mass lies.
    let rolloff = {
        let target = 0.85 * total;
        let mut cumsum = 0.0;
        let mut freq = (n_bins.saturating_sub(1)) as f32 * bin_hz;
        for (i, &m) in spectrum.iter().enumerate() {
            cumsum += m;
            if cumsum >= target && total > 0.0 {
                freq = i as f32 * bin_hz;
                break;
            }
        }
        freq
    };

    // Magnitude-weighted standard deviation around the centroid.
    let bandwidth = if total > 0.0 {
        (spectrum
            .iter()
            .enumerate()
            .map(|(i, &m)| {
                let d = i as f32 * bin_hz - centroid;
                d * d * m
            })
            .sum::<f32>()
            / total)
            .sqrt()
    } else {
        0.0
    };

    // Geometric over arithmetic mean: ~1 for noise, ~0 for pure tones.
    let flatness = {
        let log_mean =
            spectrum.iter().map(|&m| (m + EPS).ln()).sum::<f32>() / n_bins.max(1) as f32;
        let arith_mean = total / n_bins.max(1) as f32;
        log_mean.exp() / (arith_mean + EPS)
    };

    let slope = spectral_slope(spectrum, bin_hz);

    let (low_ratio, high_ratio) = band_ratios(spectrum, bin_hz, total);

    let zcr = zero_crossing_rate(frame);
    let rms = (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len().max(1) as f32).sqrt();
    let pitch = autocorrelation_pitch(frame, sample_rate);

    [
        centroid, rolloff, bandwidth, flatness, slope, low_ratio, high_ratio, zcr, rms, pitch,
    ]
}

/// Least-squares slope of log-magnitude against log-frequency.
fn spectral_slope(spectrum: &[f32], bin_hz: f32) -> f32 {
    let n = spectrum.len();
    if n < 2 {
        return 0.0;
    }
    let xs: Vec<f32> = (0..n).map(|i| (i as f32 * bin_hz + 1.0).ln()).collect();
    let ys: Vec<f32> = spectrum.iter().map(|&m| (m + EPS).ln()).collect();

    let x_mean = xs.iter().sum::<f32>() / n as f32;
    let y_mean = ys.iter().sum::<f32>() / n as f32;
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        num += (x - x_mean) * (y - y_mean);
        den += (x - x_mean) * (x - x_mean);
    }
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Magnitude fraction below 1 kHz and above 4 kHz.
fn band_ratios(spectrum: &[f32], bin_hz: f32, total: f32) -> (f32, f32) {
    if total <= 0.0 || bin_hz <= 0.0 {
        return (0.0, 0.0);
    }
    let low_idx = (LOW_BAND_HZ / bin_hz) as usize;
    let high_idx = (HIGH_BAND_HZ / bin_hz) as usize;
    let low: f32 = spectrum.iter().take(low_idx).sum();
    let high: f32 = spectrum.iter().skip(high_idx).sum();
    (low / (total + EPS), high / (total + EPS))
}

fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (frame.len() - 1) as f32
}

/// Coarse pitch from the autocorrelation peak between 80 and 400 Hz.
/// Returns 0 when the window is too short for the lag range.
fn autocorrelation_pitch(frame: &[f32], sample_rate: u32) -> f32 {
    let min_lag = (sample_rate as f32 / PITCH_MAX_HZ) as usize;
    let max_lag = (sample_rate as f32 / PITCH_MIN_HZ) as usize;
    if max_lag >= frame.len() || min_lag == 0 {
        return 0.0;
    }

    let mut best_lag = 0;
    let mut best_value = f32::NEG_INFINITY;
    for lag in min_lag..max_lag {
        let mut acc = 0.0f32;
        for i in 0..frame.len() - lag {
            acc += frame[i] * frame[i + lag];
        }
        if acc > best_value {
            best_value = acc;
            best_lag = lag;
        }
    }

    if best_lag > 0 && best_value > 0.0 {
        sample_rate as f32 / best_lag as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, n: usize, sr: u32) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        // Single nonzero bin: centroid must land on it.
        let mut spectrum = vec![0.0f32; 257];
        spectrum[64] = 1.0;
        let frame = vec![0.0f32; 512];
        let d = descriptors(&frame, &spectrum, 16000);
        let bin_hz = 8000.0 / 256.0;
        assert!((d[0] - 64.0 * bin_hz).abs() < 1.0);
    }

    #[test]
    fn test_flatness_low_for_peaky_spectrum() {
        let mut peaky = vec![0.0f32; 257];
        peaky[10] = 100.0;
        let flat = vec![1.0f32; 257];
        let frame = vec![0.0f32; 512];
        let d_peaky = descriptors(&frame, &peaky, 16000);
        let d_flat = descriptors(&frame, &flat, 16000);
        assert!(d_peaky[3] < 0.1);
        assert!(d_flat[3] > 0.9);
    }

    #[test]
    fn test_pitch_estimate_near_true_frequency() {
        let sr = 16000;
        let frame = tone(150.0, sr as usize / 4, sr);
        let pitch = autocorrelation_pitch(&frame, sr);
        assert!(
            (pitch - 150.0).abs() < 15.0,
            "expected ~150 Hz, got {pitch}"
        );
    }

    #[test]
    fn test_pitch_zero_for_short_frame() {
        assert_eq!(autocorrelation_pitch(&[0.1; 10], 16000), 0.0);
    }

    #[test]
    fn test_band_ratios_sum_bounded() {
        let spectrum = vec![1.0f32; 257];
        let total: f32 = spectrum.iter().sum();
        let (low, high) = band_ratios(&spectrum, 8000.0 / 256.0, total);
        assert!(low > 0.0 && high > 0.0);
        assert!(low + high <= 1.0 + 1e-4);
    }
}
