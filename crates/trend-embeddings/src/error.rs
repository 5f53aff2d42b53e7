//! Embedding error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// API request failed
    #[error("API request failed: {0}")]
    Api(String),

    /// Rate limit hit
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Response body could not be decoded
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The service returned a different number of vectors than texts sent
    #[error("Vector count mismatch: sent {expected} texts, got {actual} vectors")]
    CountMismatch { expected: usize, actual: usize },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Final artifact absent when a later stage needs it
    #[error("Precomputed embeddings not found at {0:?}. Run `trend-finder embed` first.")]
    MissingArtifact(PathBuf),

    /// Artifact present but unusable
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}
