//! Centroid clustering: k-means++ seeding, Lloyd iterations, seeded restarts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITERS: usize = 300;

pub(crate) struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    pub inertia: f64,
}

/// Run `restarts` seeded fits and keep the lowest-inertia solution.
pub(crate) fn run_restarts(data: &[Vec<f32>], k: usize, restarts: u64) -> Vec<usize> {
    best_fit(data, k, restarts).labels
}

pub(crate) fn best_fit(data: &[Vec<f32>], k: usize, restarts: u64) -> KMeansFit {
    let mut best = fit(data, k, 0);
    for seed in 1..restarts.max(1) {
        let candidate = fit(data, k, seed);
        if candidate.inertia < best.inertia {
            best = candidate;
        }
    }
    best
}

fn fit(data: &[Vec<f32>], k: usize, seed: u64) -> KMeansFit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = plus_plus_init(data, k, &mut rng);
    let mut labels = vec![0usize; data.len()];

    for _ in 0..MAX_ITERS {
        let mut changed = false;
        for (i, point) in data.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        let mut sums = vec![vec![0.0f64; data[0].len()]; k];
        let mut counts = vec![0usize; k];
        for (point, &label) in data.iter().zip(&labels) {
            counts[label] += 1;
            for (s, &v) in sums[label].iter_mut().zip(point) {
                *s += v as f64;
            }
        }
        for (c, (sum, &count)) in centroids.iter_mut().zip(sums.iter().zip(&counts)) {
            if count > 0 {
                for (cv, &sv) in c.iter_mut().zip(sum) {
                    *cv = sv / count as f64;
                }
            }
        }

        // Re-seed any emptied cluster with the point farthest from its centroid.
        for label in 0..k {
            if counts[label] == 0 {
                if let Some((far, _)) = data
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (i, dist_to(p, &centroids[labels[i]])))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                {
                    centroids[label] = data[far].iter().map(|&v| v as f64).collect();
                    labels[far] = label;
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    let inertia = data
        .iter()
        .zip(&labels)
        .map(|(p, &l)| dist_to(p, &centroids[l]))
        .sum();

    KMeansFit {
        labels,
        centroids,
        inertia,
    }
}

/// k-means++: spread the initial centroids with distance-weighted sampling.
fn plus_plus_init(data: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    let first = rng.gen_range(0..data.len());
    centroids.push(data[first].iter().map(|&v| v as f64).collect());

    while centroids.len() < k {
        let weights: Vec<f64> = data
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| dist_to(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // All points coincide with a centroid; duplicate one.
            let i = rng.gen_range(0..data.len());
            centroids.push(data[i].iter().map(|&v| v as f64).collect());
            continue;
        }
        let mut target = rng.gen::<f64>() * total;
        let mut chosen = data.len() - 1;
        for (i, &w) in weights.iter().enumerate() {
            target -= w;
            if target <= 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(data[chosen].iter().map(|&v| v as f64).collect());
    }
    centroids
}

fn nearest_centroid(point: &[f32], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = dist_to(point, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

fn dist_to(point: &[f32], centroid: &[f64]) -> f64 {
    point
        .iter()
        .zip(centroid)
        .map(|(&p, &c)| {
            let d = p as f64 - c;
            d * d
        })
        .sum()
}
