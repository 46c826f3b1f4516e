//! Unsupervised clustering of standardized frame features into speakers.
//!
//! All strategies take a row-major feature matrix and return one label per
//! row. Labels are arbitrary but consistent within a run; the segment layer
//! re-labels them densely for presentation.

mod agglomerative;
mod gmm;
mod kmeans;
mod spectral;

use serde::{Deserialize, Serialize};

/// K-means restarts; single-seed K-means is unstable on these features.
const KMEANS_RESTARTS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClusterStrategy {
    /// Average linkage over cosine distance. Deterministic, and degrades
    /// most gracefully when speaker separability is weak.
    #[default]
    Agglomerative,
    KMeans,
    Spectral,
    Gmm,
}

impl std::fmt::Display for ClusterStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterStrategy::Agglomerative => write!(f, "agglomerative"),
            ClusterStrategy::KMeans => write!(f, "kmeans"),
            ClusterStrategy::Spectral => write!(f, "spectral"),
            ClusterStrategy::Gmm => write!(f, "gmm"),
        }
    }
}

/// Assign a cluster label in `[0, k)` to every feature vector.
///
/// If fewer than `2 * n_speakers` frames are available the cluster count is
/// reduced rather than failing; a single remaining cluster short-circuits to
/// all-zero labels.
pub fn cluster(features: &[Vec<f32>], n_speakers: usize, strategy: ClusterStrategy) -> Vec<usize> {
    let n = features.len();
    if n == 0 {
        return Vec::new();
    }

    let mut k = n_speakers.max(1);
    if n < 2 * k {
        let reduced = (n / 2).max(1);
        tracing::debug!(
            requested = k,
            reduced,
            frames = n,
            "too few frames for requested speaker count, reducing"
        );
        k = reduced;
    }
    if k <= 1 {
        return vec![0; n];
    }

    let labels = match strategy {
        ClusterStrategy::Agglomerative => agglomerative::run(features, k),
        ClusterStrategy::KMeans => kmeans::run_restarts(features, k, KMEANS_RESTARTS),
        ClusterStrategy::Spectral => spectral::run(features, k),
        ClusterStrategy::Gmm => gmm::run(features, k),
    };
    debug_assert_eq!(labels.len(), n);
    labels
}

pub(crate) fn euclidean_sq(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        na += x as f64 * x as f64;
        nb += y as f64 * y as f64;
    }
    let denom = (na.sqrt()) * (nb.sqrt());
    if denom <= 0.0 {
        return 0.0;
    }
    1.0 - dot / denom
}
