//! # trend-ingest
//!
//! Loads findings from the published CSV sheet.
//!
//! The sheet must carry a `Stat` column with the statement text. The
//! optional `Resource Name`, `Date` and `Link` columns are kept as
//! provenance for display and never feed embedding or clustering.
//!
//! Rows with an empty statement are dropped and the survivors are numbered
//! densely from zero, so a finding's row index is stable for a given sheet.

pub mod error;
pub mod source;

pub use error::IngestError;
pub use source::{
    is_remote, load_findings, parse_findings, DATE_COLUMN, LINK_COLUMN, RESOURCE_COLUMN,
    STAT_COLUMN,
};
