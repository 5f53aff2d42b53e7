//! Clustering and summary configuration.

use serde::{Deserialize, Serialize};

use trend_types::{ClusteringSettings, SummarizerSettings};

/// DBSCAN parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Maximum cosine distance for two points to be neighbours
    #[serde(default = "default_eps")]
    pub eps: f64,

    /// Neighbourhood size, the point itself included, that makes a core point.
    /// Also the smallest cluster ever returned.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            eps: default_eps(),
            min_samples: default_min_samples(),
        }
    }
}

impl ClusteringConfig {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }
}

impl From<&ClusteringSettings> for ClusteringConfig {
    fn from(settings: &ClusteringSettings) -> Self {
        Self::new(settings.eps, settings.min_samples)
    }
}

fn default_eps() -> f64 {
    0.15
}
fn default_min_samples() -> usize {
    2
}

/// Headline generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Texts taken from the front of a cluster into the prompt
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// What the texts are, as phrased in the prompt
    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            subject: default_subject(),
        }
    }
}

impl From<&SummarizerSettings> for SummaryConfig {
    fn from(settings: &SummarizerSettings) -> Self {
        Self {
            max_samples: settings.max_samples,
            subject: settings.subject.clone(),
        }
    }
}

fn default_max_samples() -> usize {
    10
}
fn default_subject() -> String {
    "cybersecurity findings".to_string()
}
