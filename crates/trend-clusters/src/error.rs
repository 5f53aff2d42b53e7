//! Clustering and summarization error types.

use thiserror::Error;

/// Errors that can occur during clustering or headline generation.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embeddings of differing length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// LLM request failed
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// Rate limit hit
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// LLM response could not be used
    #[error("Failed to parse LLM response: {0}")]
    Parse(String),
}
