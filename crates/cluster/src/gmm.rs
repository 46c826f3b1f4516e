//! Diagonal-covariance Gaussian mixture, EM from a K-means warm start,
//! hardened to labels by maximum responsibility.

use crate::kmeans;

const EM_ITERS: usize = 50;
const MIN_VARIANCE: f64 = 1e-6;

pub(crate) fn run(data: &[Vec<f32>], k: usize) -> Vec<usize> {
    let n = data.len();
    let dim = data[0].len();

    let warm = kmeans::best_fit(data, k, 1);
    let mut means = warm.centroids;
    let mut variances = vec![global_variance(data); k];
    let mut weights = vec![1.0 / k as f64; k];
    let mut responsibilities = vec![vec![0.0f64; k]; n];

    let mut prev_ll = f64::NEG_INFINITY;
    for _ in 0..EM_ITERS {
        // E-step: log responsibilities via log-sum-exp.
        let mut log_likelihood = 0.0f64;
        for (i, point) in data.iter().enumerate() {
            let log_probs: Vec<f64> = (0..k)
                .map(|c| weights[c].max(1e-300).ln() + log_gaussian(point, &means[c], &variances[c]))
                .collect();
            let max = log_probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let sum_exp: f64 = log_probs.iter().map(|&lp| (lp - max).exp()).sum();
            let log_norm = max + sum_exp.ln();
            log_likelihood += log_norm;
            for (r, &lp) in responsibilities[i].iter_mut().zip(log_probs.iter()) {
                *r = (lp - log_norm).exp();
            }
        }

        // M-step.
        for c in 0..k {
            let resp_sum: f64 = responsibilities.iter().map(|r| r[c]).sum();
            if resp_sum <= 1e-12 {
                continue;
            }
            weights[c] = resp_sum / n as f64;
            for d in 0..dim {
                let mean = data
                    .iter()
                    .zip(&responsibilities)
                    .map(|(p, r)| r[c] * p[d] as f64)
                    .sum::<f64>()
                    / resp_sum;
                means[c][d] = mean;
            }
            for d in 0..dim {
                let var = data
                    .iter()
                    .zip(&responsibilities)
                    .map(|(p, r)| {
                        let diff = p[d] as f64 - means[c][d];
                        r[c] * diff * diff
                    })
                    .sum::<f64>()
                    / resp_sum;
                variances[c][d] = var.max(MIN_VARIANCE);
            }
        }

        if (log_likelihood - prev_ll).abs() < 1e-6 {
            break;
        }
        prev_ll = log_likelihood;
    }

    responsibilities
        .iter()
        .map(|r| {
            r.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(c, _)| c)
                .unwrap_or(0)
        })
        .collect()
}

fn log_gaussian(point: &[f32], mean: &[f64], variance: &[f64]) -> f64 {
    let mut acc = 0.0f64;
    for ((&p, &m), &v) in point.iter().zip(mean).zip(variance) {
        let diff = p as f64 - m;
        acc += -0.5 * (diff * diff / v + v.ln() + (2.0 * std::f64::consts::PI).ln());
    }
    acc
}

fn global_variance(data: &[Vec<f32>]) -> Vec<f64> {
    let n = data.len() as f64;
    let dim = data[0].len();
    let mut means = vec![0.0f64; dim];
    for p in data {
        for (m, &v) in means.iter_mut().zip(p) {
            *m += v as f64 / n;
        }
    }
    let mut vars = vec![0.0f64; dim];
    for p in data {
        for d in 0..dim {
            let diff = p[d] as f64 - means[d];
            vars[d] += diff * diff / n;
        }
    }
    for v in &mut vars {
        *v = v.max(MIN_VARIANCE);
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_gaussian_peaks_at_mean() {
        let mean = vec![0.0f64, 0.0];
        let var = vec![1.0f64, 1.0];
        let at_mean = log_gaussian(&[0.0, 0.0], &mean, &var);
        let away = log_gaussian(&[2.0, 2.0], &mean, &var);
        assert!(at_mean > away);
    }

    #[test]
    fn test_global_variance_floor() {
        let data = vec![vec![3.0f32], vec![3.0], vec![3.0]];
        let vars = global_variance(&data);
        assert!(vars[0] >= MIN_VARIANCE);
    }

    #[test]
    fn test_separates_far_clusters() {
        let mut data = Vec::new();
        for i in 0..10 {
            data.push(vec![0.0 + i as f32 * 0.05, 1.0]);
            data.push(vec![50.0 + i as f32 * 0.05, -1.0]);
        }
        let labels = run(&data, 2);
        // Even indices one cluster, odd the other.
        for pair in labels.chunks(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
