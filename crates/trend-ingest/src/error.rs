//! Ingest error types.

use thiserror::Error;

/// Errors that can occur while loading findings.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A required column is absent from the sheet header
    #[error("The '{0}' column is missing!")]
    MissingColumn(String),

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Fetching the remote sheet failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local sheet failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
