//! DBSCAN over a precomputed distance matrix.
//!
//! A point is a core point when at least `min_samples` points (itself
//! included) lie within `eps` of it. Clusters grow outward from core points
//! in row order; non-core points reached from a core point join that
//! cluster as border points, first cluster wins. Everything else is noise.

use crate::similarity::DistanceMatrix;

/// Density-based clustering parameters.
#[derive(Debug, Clone, Copy)]
pub struct Dbscan {
    pub eps: f64,
    pub min_samples: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Label every point; `None` marks noise.
    pub fn fit_predict(&self, distances: &DistanceMatrix) -> Vec<Option<usize>> {
        let n = distances.len();
        let neighborhoods: Vec<Vec<usize>> =
            (0..n).map(|i| distances.neighbors(i, self.eps)).collect();
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|nb| nb.len() >= self.min_samples)
            .collect();

        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut next_label = 0;

        for seed in 0..n {
            if labels[seed].is_some() || !is_core[seed] {
                continue;
            }

            let label = next_label;
            next_label += 1;
            labels[seed] = Some(label);

            let mut stack = vec![seed];
            while let Some(point) = stack.pop() {
                for &neighbor in &neighborhoods[point] {
                    if labels[neighbor].is_none() {
                        labels[neighbor] = Some(label);
                        if is_core[neighbor] {
                            stack.push(neighbor);
                        }
                    }
                }
            }
        }

        labels
    }
}
