//! Finding type.
//!
//! A finding is one short statement from the source sheet together with the
//! provenance columns that travel with it. Findings are identified by their
//! row position after blank statements have been dropped.

use serde::{Deserialize, Serialize};

/// Placeholder shown when a finding has no resource name.
pub const UNKNOWN_RESOURCE: &str = "Unknown Resource";

/// Placeholder shown when a finding has no date.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// A single text statement with optional provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Dense row index in load order
    pub row: usize,

    /// The statement itself (the `Stat` column)
    pub text: String,

    /// Publishing resource (the `Resource Name` column)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    /// Publication date as written in the sheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Source link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Finding {
    /// Create a finding without provenance.
    pub fn new(row: usize, text: impl Into<String>) -> Self {
        Self {
            row,
            text: text.into(),
            resource_name: None,
            date: None,
            link: None,
        }
    }

    /// Attach the resource name.
    pub fn with_resource_name(mut self, resource_name: impl Into<String>) -> Self {
        self.resource_name = Some(resource_name.into());
        self
    }

    /// Attach the publication date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Attach the source link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Resource name, or the display placeholder.
    pub fn resource_or_unknown(&self) -> &str {
        self.resource_name.as_deref().unwrap_or(UNKNOWN_RESOURCE)
    }

    /// Date, or the display placeholder.
    pub fn date_or_unknown(&self) -> &str {
        self.date.as_deref().unwrap_or(UNKNOWN_DATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_builder() {
        let finding = Finding::new(3, "Ransomware up 40%")
            .with_resource_name("Threat Report")
            .with_date("2024-05-01")
            .with_link("https://example.com/report");

        assert_eq!(finding.row, 3);
        assert_eq!(finding.resource_or_unknown(), "Threat Report");
        assert_eq!(finding.date_or_unknown(), "2024-05-01");
        assert_eq!(finding.link.as_deref(), Some("https://example.com/report"));
    }

    #[test]
    fn test_finding_placeholders() {
        let finding = Finding::new(0, "Phishing remains the top vector");
        assert_eq!(finding.resource_or_unknown(), UNKNOWN_RESOURCE);
        assert_eq!(finding.date_or_unknown(), UNKNOWN_DATE);
    }

    #[test]
    fn test_finding_serialization_skips_missing() {
        let finding = Finding::new(1, "text");
        let json = serde_json::to_string(&finding).unwrap();
        assert!(!json.contains("resource_name"));

        let decoded: Finding = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, finding);
    }
}
