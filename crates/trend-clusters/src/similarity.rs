//! Vector similarity functions.
//!
//! Pure Rust implementations without external dependencies.

use crate::error::ClusterError;

/// Calculate cosine similarity between two vectors.
///
/// Returns value in [-1.0, 1.0] where 1.0 = identical direction, give or
/// take floating-point rounding.
///
/// # Panics
/// Panics if vectors have different dimensions.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Symmetric pairwise distance matrix.
///
/// `distance = 1 - clip(cosine_similarity, 0, 1)`, so every entry is in
/// [0, 1] and the diagonal is exactly 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute the matrix for `embeddings`, which must share one dimension.
    pub fn from_embeddings(embeddings: &[Vec<f32>]) -> Result<Self, ClusterError> {
        let n = embeddings.len();
        if let Some(first) = embeddings.first() {
            let expected = first.len();
            if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
                return Err(ClusterError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                });
            }
        }

        let mut data = vec![0.0f64; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = cosine_similarity(&embeddings[i], &embeddings[j]).clamp(0.0, 1.0);
                let dist = 1.0 - sim as f64;
                data[i * n + j] = dist;
                data[j * n + i] = dist;
            }
        }

        Ok(Self { n, data })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between points `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Points within `eps` of `i`, `i` itself included, ascending.
    pub fn neighbors(&self, i: usize, eps: f64) -> Vec<usize> {
        let row = &self.data[i * self.n..(i + 1) * self.n];
        row.iter()
            .enumerate()
            .filter(|(_, &d)| d <= eps)
            .map(|(j, _)| j)
            .collect()
    }
}
