//! Similarity clustering of embedded findings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ClusteringConfig;
use crate::dbscan::Dbscan;
use crate::error::ClusterError;
use crate::similarity::DistanceMatrix;

/// A group of similar findings.
///
/// Labels are opaque and only meaningful within one clustering run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub label: usize,
    /// Row indices, ascending
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member texts in row order, picked out of the full corpus.
    pub fn texts<'a, S: AsRef<str>>(&self, corpus: &'a [S]) -> Vec<&'a str> {
        self.members
            .iter()
            .filter_map(|&row| corpus.get(row).map(AsRef::as_ref))
            .collect()
    }
}

/// Groups embeddings with DBSCAN over clipped cosine distances.
#[derive(Debug, Clone)]
pub struct SimilarityClusterer {
    config: ClusteringConfig,
}

impl SimilarityClusterer {
    /// Create a clusterer, rejecting unusable parameters.
    pub fn new(config: ClusteringConfig) -> Result<Self, ClusterError> {
        if !config.eps.is_finite() || config.eps < 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "eps must be a non-negative number, got {}",
                config.eps
            )));
        }
        if config.min_samples == 0 {
            return Err(ClusterError::InvalidConfig(
                "min_samples must be > 0".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Cluster `embeddings`, where position is row index.
    ///
    /// Returns disjoint clusters ordered by label, each with at least
    /// `min_samples` members. Noise rows appear in no cluster.
    pub fn cluster(&self, embeddings: &[Vec<f32>]) -> Result<Vec<Cluster>, ClusterError> {
        if embeddings.is_empty() {
            return Ok(Vec::new());
        }

        let distances = DistanceMatrix::from_embeddings(embeddings)?;
        let labels = Dbscan::new(self.config.eps, self.config.min_samples).fit_predict(&distances);
        let clusters = group_labels(&labels, self.config.min_samples);

        let clustered: usize = clusters.iter().map(Cluster::len).sum();
        info!(
            points = embeddings.len(),
            clusters = clusters.len(),
            noise = embeddings.len() - clustered,
            eps = self.config.eps,
            min_samples = self.config.min_samples,
            "Clustering complete"
        );

        Ok(clusters)
    }
}

/// Collect labelled rows into clusters, skipping noise.
///
/// A cluster whose border points were all claimed by earlier clusters can
/// end up smaller than `min_samples`; such clusters are treated as noise.
fn group_labels(labels: &[Option<usize>], min_samples: usize) -> Vec<Cluster> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, label) in labels.iter().enumerate() {
        if let Some(label) = label {
            groups.entry(*label).or_default().push(row);
        }
    }

    groups
        .into_iter()
        .filter(|(label, members)| {
            let keep = members.len() >= min_samples;
            if !keep {
                debug!(label, size = members.len(), "Dropping undersized cluster");
            }
            keep
        })
        .map(|(label, members)| Cluster { label, members })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Unit vector whose cosine similarity with [1, 0, 0] is `sim`.
    fn with_similarity(sim: f32) -> Vec<f32> {
        vec![sim, (1.0 - sim * sim).sqrt(), 0.0]
    }

    fn clusterer() -> SimilarityClusterer {
        SimilarityClusterer::new(ClusteringConfig::default()).unwrap()
    }

    #[test]
    fn test_close_pair_forms_one_cluster() {
        // Similarity 0.97 -> distance 0.03, within eps 0.15
        let embeddings = vec![vec![1.0, 0.0, 0.0], with_similarity(0.97)];
        let clusters = clusterer().cluster(&embeddings).unwrap();

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1]);
    }

    #[test]
    fn test_isolated_point_is_noise() {
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            with_similarity(0.97),
            vec![0.0, 0.0, 1.0],
        ];
        let clusters = clusterer().cluster(&embeddings).unwrap();

        assert_eq!(clusters.len(), 1);
        assert!(clusters.iter().all(|c| !c.members.contains(&2)));
    }

    #[test]
    fn test_clusters_are_disjoint_and_large_enough() {
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            with_similarity(0.99),
            vec![0.0, 0.98, 0.2],
            vec![0.0, 0.0, 1.0],
            vec![0.05, 0.0, 1.0],
            vec![-1.0, 0.0, 0.0],
        ];
        let clusters = clusterer().cluster(&embeddings).unwrap();

        assert_eq!(clusters.len(), 3);
        let mut seen = HashSet::new();
        for cluster in &clusters {
            assert!(cluster.len() >= 2);
            for row in &cluster.members {
                assert!(seen.insert(*row), "row {row} in two clusters");
            }
        }
        assert!(!seen.contains(&6));
    }

    #[test]
    fn test_empty_input() {
        assert!(clusterer().cluster(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
        assert!(matches!(
            clusterer().cluster(&embeddings),
            Err(ClusterError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        assert!(SimilarityClusterer::new(ClusteringConfig::new(-0.1, 2)).is_err());
        assert!(SimilarityClusterer::new(ClusteringConfig::new(f64::NAN, 2)).is_err());
        assert!(SimilarityClusterer::new(ClusteringConfig::new(0.15, 0)).is_err());
    }

    #[test]
    fn test_larger_min_samples_turns_pairs_into_noise() {
        let embeddings = vec![vec![1.0, 0.0, 0.0], with_similarity(0.97)];
        let clusterer = SimilarityClusterer::new(ClusteringConfig::new(0.15, 3)).unwrap();
        assert!(clusterer.cluster(&embeddings).unwrap().is_empty());
    }

    #[test]
    fn test_group_labels_drops_noise_and_undersized() {
        let labels = vec![Some(0), None, Some(1), Some(0), Some(2), Some(2), Some(2)];
        let clusters = group_labels(&labels, 2);

        assert_eq!(
            clusters,
            vec![
                Cluster {
                    label: 0,
                    members: vec![0, 3]
                },
                Cluster {
                    label: 2,
                    members: vec![4, 5, 6]
                },
            ]
        );
    }

    #[test]
    fn test_cluster_texts() {
        let corpus = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let cluster = Cluster {
            label: 0,
            members: vec![0, 2],
        };
        assert_eq!(cluster.texts(&corpus), vec!["a", "c"]);
    }
}
