//! # trend-types
//!
//! Shared domain types for the trend finder.
//!
//! This crate defines the data structures used by every stage of the pipeline:
//! - Findings: Immutable text statements loaded from the source sheet
//! - Settings: Layered configuration for embedding, clustering and summarizing
//! - TrendError: Configuration and validation failures
//!
//! ## Usage
//!
//! ```rust
//! use trend_types::Finding;
//!
//! let finding = Finding::new(0, "62% of breaches involve stolen credentials");
//! assert_eq!(finding.row, 0);
//! ```

pub mod config;
pub mod error;
pub mod finding;

pub use config::{ClusteringSettings, EmbeddingSettings, Settings, SummarizerSettings};
pub use error::TrendError;
pub use finding::{Finding, UNKNOWN_DATE, UNKNOWN_RESOURCE};
