//! Trend report rendering.

use serde::Serialize;

use trend_clusters::Cluster;
use trend_embeddings::EmbeddingRecord;
use trend_types::{Finding, UNKNOWN_DATE, UNKNOWN_RESOURCE};

/// Printed when clustering found nothing.
pub const NO_TRENDS: &str = "No strong trend groups found.";

/// One finding inside a trend, with whatever provenance is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub row: usize,
    pub text: String,
    pub resource_name: Option<String>,
    pub date: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendGroup {
    pub label: usize,
    pub headline: Option<String>,
    pub findings: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub total_findings: usize,
    pub noise: usize,
    pub trends: Vec<TrendGroup>,
}

impl TrendReport {
    /// Assemble the report.
    ///
    /// `headlines[i]` belongs to `clusters[i]`. Provenance is taken from the
    /// finding at the same row, and only when its text still matches the
    /// embedded text.
    pub fn build(
        records: &[EmbeddingRecord],
        clusters: &[Cluster],
        headlines: &[Option<String>],
        provenance: Option<&[Finding]>,
    ) -> Self {
        let trends: Vec<TrendGroup> = clusters
            .iter()
            .enumerate()
            .map(|(i, cluster)| TrendGroup {
                label: cluster.label,
                headline: headlines.get(i).cloned().flatten(),
                findings: cluster
                    .members
                    .iter()
                    .filter_map(|&row| records.get(row))
                    .map(|record| entry(record, provenance))
                    .collect(),
            })
            .collect();

        let clustered: usize = trends.iter().map(|t| t.findings.len()).sum();
        Self {
            total_findings: records.len(),
            noise: records.len().saturating_sub(clustered),
            trends,
        }
    }

    /// Plain-text report.
    pub fn render_text(&self) -> String {
        if self.trends.is_empty() {
            return format!("{NO_TRENDS}\n");
        }

        let mut out = String::new();
        for trend in &self.trends {
            out.push_str(&format!(
                "Cluster {} ({} findings)\n",
                trend.label,
                trend.findings.len()
            ));
            match &trend.headline {
                Some(headline) => out.push_str(&format!("Headline: {headline}\n")),
                None => out.push_str("Headline: (none)\n"),
            }
            for entry in &trend.findings {
                out.push_str(&format_entry(entry));
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn entry(record: &EmbeddingRecord, provenance: Option<&[Finding]>) -> ReportEntry {
    let finding = provenance
        .and_then(|findings| findings.get(record.row))
        .filter(|f| f.text == record.text);

    ReportEntry {
        row: record.row,
        text: record.text.clone(),
        resource_name: finding.and_then(|f| f.resource_name.clone()),
        date: finding.and_then(|f| f.date.clone()),
        link: finding.and_then(|f| f.link.clone()),
    }
}

fn format_entry(entry: &ReportEntry) -> String {
    let resource = entry.resource_name.as_deref().unwrap_or(UNKNOWN_RESOURCE);
    let date = entry.date.as_deref().unwrap_or(UNKNOWN_DATE);
    match &entry.link {
        Some(link) => format!("- \"{}\" — {} [{}] ({})", entry.text, resource, link, date),
        None => format!("- \"{}\" — {} ({})", entry.text, resource, date),
    }
}
