//! Mock LLM client for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ClusterError;
use crate::summarizer::LlmClient;

/// LLM client that answers every prompt with a fixed response, or fails.
///
/// Prompts are recorded so tests can inspect what was sent.
pub struct MockLlmClient {
    response: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with `ClusterError::Llm(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, ClusterError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.response.clone().map_err(ClusterError::Llm)
    }
}
