//! Embedding service trait and types.
//!
//! Defines the capability the batch embedder drives: an ordered list of
//! texts in, one fixed-length vector per text out.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Vector embedding of one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding from a vector.
    /// Normalizes the vector to unit length.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = if norm > 0.0 {
            values.iter().map(|x| x / norm).collect()
        } else {
            values
        };
        Self { values: normalized }
    }

    /// Keep the vector exactly as the service returned it
    pub fn from_raw(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name (e.g., "text-embedding-ada-002")
    pub name: String,
    /// Embedding dimension, when known ahead of the first response
    pub dimension: Option<usize>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, dimension: Option<usize>) -> Self {
        Self {
            name: name.into(),
            dimension,
        }
    }
}

/// Remote text-embedding capability.
///
/// Implementations return exactly one vector per input text, in input order.
/// Transport and service failures surface as errors; retrying is the
/// caller's decision.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;
}
