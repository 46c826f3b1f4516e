//! Affinity-graph clustering: symmetric k-nearest-neighbour graph, leading
//! eigenvectors of the normalized affinity by power iteration, then K-means
//! on the spectral embedding.

use crate::{euclidean_sq, kmeans};

const N_NEIGHBORS: usize = 10;
const POWER_ITERS: usize = 200;

pub(crate) fn run(data: &[Vec<f32>], k: usize) -> Vec<usize> {
    let n = data.len();
    if n <= k {
        return (0..n).collect();
    }
    let n_neighbors = N_NEIGHBORS.min(n - 1);

    // Symmetric binary kNN adjacency.
    let mut adj = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        let mut dists: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, euclidean_sq(&data[i], &data[j])))
            .collect();
        dists.sort_by(|a, b| a.1.total_cmp(&b.1));
        for &(j, _) in dists.iter().take(n_neighbors) {
            adj[i][j] = 1.0;
            adj[j][i] = 1.0;
        }
    }

    // Symmetric normalization: A = D^-1/2 W D^-1/2.
    let degrees: Vec<f64> = adj.iter().map(|row| row.iter().sum::<f64>()).collect();
    let inv_sqrt: Vec<f64> = degrees
        .iter()
        .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
        .collect();
    for i in 0..n {
        for j in 0..n {
            adj[i][j] *= inv_sqrt[i] * inv_sqrt[j];
        }
    }

    let embedding = leading_eigenvectors(&adj, k);

    // Row-normalize the embedding before the final centroid pass.
    let rows: Vec<Vec<f32>> = (0..n)
        .map(|i| {
            let row: Vec<f64> = embedding.iter().map(|v| v[i]).collect();
            let norm = row.iter().map(|&x| x * x).sum::<f64>().sqrt().max(1e-12);
            row.iter().map(|&x| (x / norm) as f32).collect()
        })
        .collect();

    kmeans::run_restarts(&rows, k, 3)
}

/// Top-k eigenvectors of a symmetric matrix by power iteration with
/// Gram-Schmidt deflation against the vectors already found.
fn leading_eigenvectors(matrix: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let n = matrix.len();
    let mut vectors: Vec<Vec<f64>> = Vec::with_capacity(k);

    for idx in 0..k {
        // Deterministic varied start vector.
        let mut v: Vec<f64> = (0..n)
            .map(|i| (((i + 1) * (idx + 3)) as f64 * 0.618).sin())
            .collect();
        orthogonalize(&mut v, &vectors);
        normalize(&mut v);

        for _ in 0..POWER_ITERS {
            let mut next = vec![0.0f64; n];
            for (i, row) in matrix.iter().enumerate() {
                next[i] = row.iter().zip(&v).map(|(&a, &b)| a * b).sum();
            }
            orthogonalize(&mut next, &vectors);
            let norm = normalize(&mut next);
            if norm < 1e-12 {
                break;
            }
            let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
            v = next;
            if delta < 1e-10 {
                break;
            }
        }
        vectors.push(v);
    }
    vectors
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let dot: f64 = v.iter().zip(b).map(|(&x, &y)| x * y).sum();
        for (x, &y) in v.iter_mut().zip(b) {
            *x -= dot * y;
        }
    }
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}
