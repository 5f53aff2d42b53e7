//! # trend-clusters
//!
//! Groups embedded findings into trends and writes a headline for each.
//!
//! Clustering runs over a precomputed cosine distance matrix: similarities
//! are clipped to [0, 1] and turned into distances with `1 - similarity`,
//! then DBSCAN groups points that sit within `eps` of a dense neighbourhood.
//! Points that are not dense enough are noise and belong to no cluster.
//!
//! ## Features
//! - Clipped cosine distance matrix
//! - DBSCAN over precomputed distances
//! - LLM headline per cluster from a bounded sample of its texts
//! - OpenAI and Anthropic chat clients

pub mod api;
pub mod clusterer;
pub mod config;
pub mod dbscan;
pub mod error;
pub mod mock;
pub mod similarity;
pub mod summarizer;

pub use api::{ApiLlmClient, ApiLlmConfig, LlmProvider};
pub use clusterer::{Cluster, SimilarityClusterer};
pub use config::{ClusteringConfig, SummaryConfig};
pub use dbscan::Dbscan;
pub use error::ClusterError;
pub use mock::MockLlmClient;
pub use similarity::{cosine_similarity, DistanceMatrix};
pub use summarizer::{ClusterSummarizer, LlmClient};
