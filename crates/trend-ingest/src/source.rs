//! CSV source parsing and fetching.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use trend_types::Finding;

use crate::error::IngestError;

/// Required statement column
pub const STAT_COLUMN: &str = "Stat";
/// Optional provenance columns
pub const RESOURCE_COLUMN: &str = "Resource Name";
pub const DATE_COLUMN: &str = "Date";
pub const LINK_COLUMN: &str = "Link";

/// Whether `source` names a remote sheet rather than a local file.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load findings from an http(s) URL or a local CSV path.
pub async fn load_findings(source: &str) -> Result<Vec<Finding>, IngestError> {
    if is_remote(source) {
        info!(url = %source, "Fetching findings sheet");
        let body = reqwest::get(source)
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_findings(body.as_bytes())
    } else {
        let path = Path::new(source);
        info!(path = ?path, "Reading findings sheet");
        let file = std::fs::File::open(path)?;
        parse_findings(file)
    }
}

/// Parse findings from CSV with a header row.
///
/// Fails with [`IngestError::MissingColumn`] before reading any record when
/// the `Stat` column is absent.
pub fn parse_findings<R: Read>(reader: R) -> Result<Vec<Finding>, IngestError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    let stat_idx = column_index(&headers, STAT_COLUMN)
        .ok_or_else(|| IngestError::MissingColumn(STAT_COLUMN.to_string()))?;
    let resource_idx = column_index(&headers, RESOURCE_COLUMN);
    let date_idx = column_index(&headers, DATE_COLUMN);
    let link_idx = column_index(&headers, LINK_COLUMN);

    let mut findings = Vec::new();
    let mut dropped = 0usize;

    for record in csv.records() {
        let record = record?;
        let Some(text) = statement(&record, stat_idx) else {
            dropped += 1;
            continue;
        };

        findings.push(Finding {
            row: findings.len(),
            text,
            resource_name: cell(&record, resource_idx),
            date: cell(&record, date_idx),
            link: cell(&record, link_idx),
        });
    }

    debug!(kept = findings.len(), dropped, "Parsed findings");
    Ok(findings)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Statement text exactly as written; only empty and missing cells are `None`.
fn statement(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Trimmed cell value; blank and missing cells are `None`.
fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
