//! Cluster headline generation.
//!
//! A bounded sample of each cluster's texts is sent to an LLM, which
//! answers with a one-line trend headline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::SummaryConfig;
use crate::error::ClusterError;

/// Trait for LLM completion.
///
/// Implementations handle transport and authentication. A single call is
/// made per prompt; callers decide what to do with failures.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str) -> Result<String, ClusterError>;
}

/// Writes a headline for a cluster of texts.
pub struct ClusterSummarizer {
    llm: Arc<dyn LlmClient>,
    config: SummaryConfig,
}

impl ClusterSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>, config: SummaryConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Build the headline prompt from the first `max_samples` texts.
    pub fn build_prompt<S: AsRef<str>>(&self, texts: &[S]) -> String {
        let bullets: String = texts
            .iter()
            .take(self.config.max_samples)
            .map(|t| format!("- {}", t.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Summarize these {} into a short, clear trend headline (10-20 words):\n\n{}",
            self.config.subject, bullets
        )
    }

    /// Generate a headline for one cluster.
    ///
    /// The response is trimmed and otherwise returned as the model wrote it.
    pub async fn headline<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<String, ClusterError> {
        if texts.is_empty() {
            return Err(ClusterError::InvalidInput(
                "Cannot summarize an empty cluster".to_string(),
            ));
        }

        let prompt = self.build_prompt(texts);
        debug!(
            texts = texts.len(),
            sampled = texts.len().min(self.config.max_samples),
            "Requesting headline"
        );

        let response = self.llm.complete(&prompt).await?;
        let headline = response.trim();
        if headline.is_empty() {
            return Err(ClusterError::Parse("Empty headline".to_string()));
        }

        Ok(headline.to_string())
    }
}
