//! A seeded k-means substitute for the density/neighborhood-based
//! clustering the source system otherwise performs with HDBSCAN/UMAP. No
//! such crate exists in this ecosystem's dependency surface, so clustering
//! is hand-rolled on `ndarray` with a fixed seed (42) for reproducibility;
//! relevance is still computed from relative cluster size, not membership
//! probability, so the single-largest-cluster invariant holds regardless of
//! which clustering strategy produced the assignment.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const SEED: u64 = 42;
const MAX_ITERATIONS: usize = 100;

/// √(n/2), the heuristic the source uses to size k for small inputs, capped
/// so a handful of documents don't all land in singleton clusters.
pub fn choose_k(n: usize, min_cluster_size: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let heuristic = ((n as f64 / 2.0).sqrt()).round() as usize;
    let max_k = n / min_cluster_size.max(1);
    heuristic.clamp(1, max_k.max(1)).min(n)
}

/// Assigns each row of `points` to one of `k` clusters. Returns the cluster
/// index per row. Deterministic for identical input and `k`.
pub fn fit_predict(points: &[Vec<f32>], k: usize) -> Vec<usize> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }
    if k >= points.len() {
        return (0..points.len()).collect();
    }

    let dim = points[0].len();
    let data = Array2::from_shape_vec(
        (points.len(), dim),
        points.iter().flatten().copied().collect(),
    )
    .expect("all rows share the embedding dimension");

    let mut rng = StdRng::seed_from_u64(SEED);
    let mut indices: Vec<usize> = (0..points.len()).collect();
    indices.shuffle(&mut rng);
    let mut centroids: Array2<f32> = Array2::zeros((k, dim));
    for (c, &idx) in indices.iter().take(k).enumerate() {
        centroids.row_mut(c).assign(&data.row(idx));
    }

    let mut assignments = vec![0usize; points.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let mut best = 0usize;
            let mut best_dist = f32::MAX;
            for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
                let dist = squared_distance(row, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        let mut sums: Array2<f32> = Array2::zeros((k, dim));
        let mut counts = vec![0u32; k];
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let c = assignments[i];
            let mut sum_row = sums.row_mut(c);
            sum_row += &row;
            counts[c] += 1;
        }
        for c in 0..k {
            if counts[c] > 0 {
                let mean = sums.row(c).to_owned() / counts[c] as f32;
                centroids.row_mut(c).assign(&mean);
            }
        }

        if !changed {
            break;
        }
    }

    assignments
}

fn squared_distance(a: ndarray::ArrayView1<f32>, b: ndarray::ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index (within `members`) of the document closest to the centroid of
/// `members`, used to pick representative documents for a cluster.
pub fn closest_to_centroid(members: &[Vec<f32>], take: usize) -> Vec<usize> {
    if members.is_empty() {
        return Vec::new();
    }
    let dim = members[0].len();
    let mut centroid = Array1::<f32>::zeros(dim);
    for m in members {
        for (i, v) in m.iter().enumerate() {
            centroid[i] += v;
        }
    }
    centroid /= members.len() as f32;

    let mut ranked: Vec<(usize, f32)> = members
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let dist: f32 = m
                .iter()
                .zip(centroid.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum();
            (i, dist)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    ranked.into_iter().take(take).map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_identical_input() {
        let points = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
        ];
        let a = fit_predict(&points, 2);
        let b = fit_predict(&points, 2);
        assert_eq!(a, b);
        // the two near-origin points land together, the two far points together
        assert_eq!(a[0], a[1]);
        assert_eq!(a[2], a[3]);
        assert_ne!(a[0], a[2]);
    }

    #[test]
    fn k_at_least_input_size_is_identity() {
        let points = vec![vec![1.0], vec![2.0]];
        let assignments = fit_predict(&points, 5);
        assert_eq!(assignments, vec![0, 1]);
    }

    #[test]
    fn choose_k_respects_min_cluster_size() {
        assert_eq!(choose_k(100, 3), 7); // sqrt(50) ~= 7, capped by 100/3=33
        assert_eq!(choose_k(6, 3), 2); // capped at 6/3=2
    }
}
