//! Bottom-up hierarchical clustering, average linkage over cosine distance.
//!
//! Deterministic, no seeding. Cluster distances are maintained with the
//! Lance-Williams update for average linkage, so each merge is O(n).

use crate::cosine_distance;

pub(crate) fn run(data: &[Vec<f32>], k: usize) -> Vec<usize> {
    let n = data.len();
    if n <= k {
        return (0..n).collect();
    }

    // Condensed pairwise distances, indexed [i][j] for j < i.
    let mut dist: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..i).map(|j| cosine_distance(&data[i], &data[j])).collect())
        .collect();
    let mut active: Vec<bool> = vec![true; n];
    let mut sizes: Vec<usize> = vec![1; n];
    // Each point's current cluster representative index.
    let mut assignment: Vec<usize> = (0..n).collect();
    let mut remaining = n;

    while remaining > k {
        // Find the closest pair of active clusters.
        let mut best = (0usize, 0usize);
        let mut best_d = f64::INFINITY;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in 0..i {
                if !active[j] {
                    continue;
                }
                if dist[i][j] < best_d {
                    best_d = dist[i][j];
                    best = (i, j);
                }
            }
        }

        let (hi, lo) = best;
        // Merge hi into lo; update average-linkage distances to every other
        // cluster: d(m, lo+hi) = (|lo| d(m,lo) + |hi| d(m,hi)) / (|lo|+|hi|).
        let (sz_lo, sz_hi) = (sizes[lo] as f64, sizes[hi] as f64);
        for m in 0..n {
            if !active[m] || m == lo || m == hi {
                continue;
            }
            let d_lo = condensed(&dist, m, lo);
            let d_hi = condensed(&dist, m, hi);
            let merged = (sz_lo * d_lo + sz_hi * d_hi) / (sz_lo + sz_hi);
            set_condensed(&mut dist, m, lo, merged);
        }

        sizes[lo] += sizes[hi];
        active[hi] = false;
        for a in assignment.iter_mut() {
            if *a == hi {
                *a = lo;
            }
        }
        remaining -= 1;
    }

    // Compact representative indices to dense labels.
    let mut label_of = vec![usize::MAX; n];
    let mut next = 0;
    assignment
        .iter()
        .map(|&rep| {
            if label_of[rep] == usize::MAX {
                label_of[rep] = next;
                next += 1;
            }
            label_of[rep]
        })
        .collect()
}

fn condensed(dist: &[Vec<f64>], a: usize, b: usize) -> f64 {
    if a > b {
        dist[a][b]
    } else {
        dist[b][a]
    }
}

fn set_condensed(dist: &mut [Vec<f64>], a: usize, b: usize, value: f64) {
    if a > b {
        dist[a][b] = value;
    } else {
        dist[b][a] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_directions_split_cleanly() {
        // Cosine distance cares about direction, not magnitude.
        let data = vec![
            vec![1.0, 0.05],
            vec![2.0, 0.0],
            vec![4.0, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 3.0],
            vec![0.05, 2.0],
        ];
        let labels = run(&data, 2);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_k_equal_n_is_identity() {
        let data = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(run(&data, 2), vec![0, 1]);
    }

    #[test]
    fn test_labels_are_dense() {
        let data: Vec<Vec<f32>> = (0..9)
            .map(|i| match i % 3 {
                0 => vec![1.0, 0.0, 0.0],
                1 => vec![0.0, 1.0, 0.0],
                _ => vec![0.0, 0.0, 1.0],
            })
            .collect();
        let mut labels = run(&data, 3);
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels, vec![0, 1, 2]);
    }
}
