//! Energy-threshold strategy with an adaptive percentile baseline and a
//! zero-crossing plausibility band, cleaned up with binary morphology.

use crate::{collapse_flags, VoiceInterval};

#[derive(Debug, Clone, Copy)]
pub struct EnergyVadConfig {
    pub window_s: f32,
    pub hop_s: f32,
    /// Energy floor as a fraction of the loudest window.
    pub floor_ratio: f32,
    /// Percentile (0..100) of nonzero window energies used as the baseline.
    pub percentile: f32,
}

impl Default for EnergyVadConfig {
    fn default() -> Self {
        Self {
            window_s: 0.2,
            hop_s: 0.05,
            floor_ratio: 0.001,
            percentile: 10.0,
        }
    }
}

pub(crate) fn detect(
    samples: &[f32],
    sample_rate: u32,
    config: &EnergyVadConfig,
) -> Vec<VoiceInterval> {
    let window = (config.window_s * sample_rate as f32) as usize;
    let hop = (config.hop_s * sample_rate as f32) as usize;
    if window == 0 || hop == 0 || samples.len() < window {
        return Vec::new();
    }

    let mut energies = Vec::new();
    let mut zcrs = Vec::new();
    let mut starts = Vec::new();
    let mut pos = 0;
    while pos + window <= samples.len() {
        let frame = &samples[pos..pos + window];
        energies.push(rms(frame));
        zcrs.push(zero_crossing_rate(frame));
        starts.push(pos as f32 / sample_rate as f32);
        pos += hop;
    }

    let max_energy = energies.iter().cloned().fold(0.0f32, f32::max);
    if max_energy <= 0.0 {
        return Vec::new();
    }
    let baseline = percentile_nonzero(&energies, config.percentile).unwrap_or(0.0);
    let threshold = baseline.max(config.floor_ratio * max_energy);

    // Voiced windows sit above the adaptive energy threshold and inside a
    // plausible zero-crossing band (mean - 0.5 sigma .. mean + 2 sigma).
    let (zcr_mean, zcr_std) = mean_std(&zcrs);
    let mut flags: Vec<bool> = energies
        .iter()
        .zip(&zcrs)
        .map(|(&e, &z)| {
            e >= threshold && z >= zcr_mean - 0.5 * zcr_std && z <= zcr_mean + 2.0 * zcr_std
        })
        .collect();

    // Erode once then dilate twice: strips one-frame blips, then restores
    // the boundary frames the erosion consumed.
    flags = erode(&flags);
    flags = dilate(&flags);
    flags = dilate(&flags);

    collapse_flags(&flags, &starts, config.window_s)
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
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

fn percentile_nonzero(values: &[f32], p: f32) -> Option<f32> {
    let mut nonzero: Vec<f32> = values.iter().cloned().filter(|&v| v > 0.0).collect();
    if nonzero.is_empty() {
        return None;
    }
    nonzero.sort_by(|a, b| a.total_cmp(b));
    let rank = (p / 100.0 * (nonzero.len() - 1) as f32).round() as usize;
    Some(nonzero[rank.min(nonzero.len() - 1)])
}

fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let var = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / values.len() as f32;
    (mean, var.sqrt())
}

fn erode(flags: &[bool]) -> Vec<bool> {
    let n = flags.len();
    (0..n)
        .map(|i| {
            let left = i > 0 && flags[i - 1];
            let right = i + 1 < n && flags[i + 1];
            flags[i] && left && right
        })
        .collect()
}

fn dilate(flags: &[bool]) -> Vec<bool> {
    let n = flags.len();
    (0..n)
        .map(|i| {
            flags[i] || (i > 0 && flags[i - 1]) || (i + 1 < n && flags[i + 1])
        })
        .collect()
}
