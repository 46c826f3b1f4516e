//! Mel-cepstral coefficients and their time derivatives.
//!
//! A window is cut into four half-overlapping sub-frames; each sub-frame
//! yields 13 coefficients (26-band Slaney mel filterbank, log compression,
//! orthonormal DCT-II). The short trajectory gives the deltas something to
//! measure before everything is mean-pooled back to one vector per window.

use rustfft::{num_complex::Complex, Fft};
use std::sync::Arc;

use crate::N_CEPSTRA;

const LOG_GUARD: f32 = 1e-10;

/// Cepstral coefficients for each sub-frame of the window, in time order.
pub(crate) fn cepstral_trajectory(
    frame: &[f32],
    fft: &Arc<dyn Fft<f32>>,
    hann: &[f32],
    mel_bank: &[Vec<f32>],
    n_fft: usize,
) -> Vec<[f32; N_CEPSTRA]> {
    let n_bins = n_fft / 2 + 1;
    let sub_hop = (frame.len() / 4).max(n_fft / 2).max(1);
    let mut buf: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); n_fft];
    let mut trajectory = Vec::new();

    let mut pos = 0;
    while pos + n_fft <= frame.len() {
        for (b, (&s, &w)) in buf.iter_mut().zip(frame[pos..].iter().zip(hann.iter())) {
            *b = Complex::new(s * w, 0.0);
        }
        fft.process(&mut buf);

        let mut mel_energies = vec![0.0f32; mel_bank.len()];
        for (m, filter) in mel_bank.iter().enumerate() {
            let mut acc = 0.0f32;
            for (k, &weight) in filter.iter().enumerate().take(n_bins) {
                let c = buf[k];
                acc += weight * (c.re * c.re + c.im * c.im);
            }
            mel_energies[m] = (acc + LOG_GUARD).ln();
        }

        trajectory.push(dct_ii(&mel_energies));
        pos += sub_hop;
    }

    trajectory
}

/// Mean-pool the trajectory and its first/second discrete derivatives.
pub(crate) fn pool_with_deltas(
    trajectory: &[[f32; N_CEPSTRA]],
) -> ([f32; N_CEPSTRA], [f32; N_CEPSTRA], [f32; N_CEPSTRA]) {
    let mut mfcc = [0.0f32; N_CEPSTRA];
    let mut delta = [0.0f32; N_CEPSTRA];
    let mut delta2 = [0.0f32; N_CEPSTRA];
    let n = trajectory.len();
    if n == 0 {
        return (mfcc, delta, delta2);
    }

    for c in trajectory {
        for (m, &v) in mfcc.iter_mut().zip(c.iter()) {
            *m += v;
        }
    }
    for m in &mut mfcc {
        *m /= n as f32;
    }

    let d1 = gradient(trajectory);
    let d2 = gradient(&d1);
    for c in &d1 {
        for (m, &v) in delta.iter_mut().zip(c.iter()) {
            *m += v;
        }
    }
    for c in &d2 {
        for (m, &v) in delta2.iter_mut().zip(c.iter()) {
            *m += v;
        }
    }
    for m in &mut delta {
        *m /= n as f32;
    }
    for m in &mut delta2 {
        *m /= n as f32;
    }

    (mfcc, delta, delta2)
}

/// Central differences with replicated edges, matching numpy's gradient.
fn gradient(trajectory: &[[f32; N_CEPSTRA]]) -> Vec<[f32; N_CEPSTRA]> {
    let n = trajectory.len();
    (0..n)
        .map(|t| {
            let prev = &trajectory[t.saturating_sub(1)];
            let next = &trajectory[(t + 1).min(n - 1)];
            let span = ((t + 1).min(n - 1) - t.saturating_sub(1)).max(1) as f32;
            let mut out = [0.0f32; N_CEPSTRA];
            for k in 0..N_CEPSTRA {
                out[k] = (next[k] - prev[k]) / span;
            }
            out
        })
        .collect()
}

/// Orthonormal DCT-II, truncated to the first `N_CEPSTRA` coefficients.
fn dct_ii(input: &[f32]) -> [f32; N_CEPSTRA] {
    let n = input.len();
    let mut out = [0.0f32; N_CEPSTRA];
    if n == 0 {
        return out;
    }
    let scale = (2.0 / n as f32).sqrt();
    for (k, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (i, &x) in input.iter().enumerate() {
            acc += x
                * (std::f32::consts::PI * k as f32 * (2.0 * i as f32 + 1.0) / (2.0 * n as f32))
                    .cos();
        }
        let norm = if k == 0 {
            scale / std::f32::consts::SQRT_2
        } else {
            scale
        };
        *o = acc * norm;
    }
    out
}

fn hertz_to_mel(freq: f32) -> f32 {
    let min_log_hertz = 1000.0;
    let min_log_mel = 15.0;
    let logstep = 27.0 / 6.4f32.ln();
    if freq >= min_log_hertz {
        min_log_mel + (freq / min_log_hertz).ln() * logstep
    } else {
        3.0 * freq / 200.0
    }
}

fn mel_to_hertz(mels: f32) -> f32 {
    let min_log_hertz = 1000.0;
    let min_log_mel = 15.0;
    let logstep = 6.4f32.ln() / 27.0;
    if mels >= min_log_mel {
        min_log_hertz * (logstep * (mels - min_log_mel)).exp()
    } else {
        200.0 * mels / 3.0
    }
}

/// Triangular Slaney-normalized mel filterbank, one row per mel band.
pub(crate) fn mel_filter_bank(
    n_bins: usize,
    n_mels: usize,
    sample_rate: u32,
    min_hz: f32,
    max_hz: f32,
) -> Vec<Vec<f32>> {
    let mel_min = hertz_to_mel(min_hz);
    let mel_max = hertz_to_mel(max_hz);

    let filter_freqs: Vec<f32> = (0..n_mels + 2)
        .map(|i| {
            let t = i as f32 / (n_mels + 1) as f32;
            mel_to_hertz(mel_min + t * (mel_max - mel_min))
        })
        .collect();

    let nyquist = sample_rate as f32 / 2.0;
    let fft_freqs: Vec<f32> = if n_bins == 1 {
        vec![0.0]
    } else {
        (0..n_bins)
            .map(|i| i as f32 / (n_bins - 1) as f32 * nyquist)
            .collect()
    };

    let mut bank = vec![vec![0.0f32; n_bins]; n_mels];
    for (m, row) in bank.iter_mut().enumerate() {
        let f_left = filter_freqs[m];
        let f_center = filter_freqs[m + 1];
        let f_right = filter_freqs[m + 2];
        let enorm = 2.0 / (f_right - f_left);
        for (k, &ff) in fft_freqs.iter().enumerate() {
            let up = (ff - f_left) / (f_center - f_left);
            let down = (f_right - ff) / (f_right - f_center);
            row[k] = up.min(down).max(0.0) * enorm;
        }
    }
    bank
}
