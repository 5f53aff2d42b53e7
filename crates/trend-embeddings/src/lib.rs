//! # trend-embeddings
//!
//! Durable, resumable embedding of the findings corpus.
//!
//! The corpus is embedded in fixed-size batches through a remote
//! [`EmbeddingService`]. After every batch the accumulated vectors are written
//! to a checkpoint, so an interrupted run picks up where it stopped. Once
//! every row has a vector the final artifact is written and the checkpoint
//! removed.
//!
//! ## Features
//! - Pluggable embedding service (OpenAI-compatible client included)
//! - bincode-encoded checkpoint and final artifacts
//! - All-or-nothing batch skip on resume
//! - Failed batches wait a fixed delay and are retried by the next run

pub mod artifact;
pub mod batch;
pub mod error;
pub mod mock;
pub mod model;
pub mod openai;

pub use artifact::{
    ArtifactStatus, ArtifactStore, EmbeddingRecord, FinalArtifact, PartialArtifact,
    ARTIFACT_VERSION,
};
pub use batch::{BatchConfig, BatchEmbedder, EmbedOutcome};
pub use error::EmbeddingError;
pub use mock::MockEmbeddingService;
pub use model::{Embedding, EmbeddingService, ModelInfo};
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingService};
