//! LLM client for OpenAI-compatible and Anthropic chat endpoints.

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use trend_types::SummarizerSettings;

use crate::error::ClusterError;
use crate::summarizer::LlmClient;

/// Which wire format the endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// `/chat/completions`
    OpenAi,
    /// `/messages`
    Anthropic,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            other => Err(ClusterError::InvalidConfig(format!(
                "unknown LLM provider: {other}"
            ))),
        }
    }
}

/// Configuration for the API-backed LLM client.
#[derive(Debug, Clone)]
pub struct ApiLlmConfig {
    pub provider: LlmProvider,

    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// Model to use (e.g., "gpt-4", "claude-3-haiku-20240307")
    pub model: String,

    /// API key
    pub api_key: SecretString,

    /// Completion length cap, sent to Anthropic only
    pub max_tokens: u32,
}

impl ApiLlmConfig {
    fn with_provider(
        provider: LlmProvider,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
            max_tokens: 256,
        }
    }

    /// Create config for OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::OpenAi, api_key, model)
    }

    /// Create config for Anthropic API.
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::Anthropic, api_key, model)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build from loaded settings. Fails when no API key is available.
    pub fn from_settings(settings: &SummarizerSettings) -> Result<Self, ClusterError> {
        let provider = LlmProvider::from_str(&settings.provider)?;
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ClusterError::InvalidConfig(format!(
                    "no API key configured for {} summarizer",
                    settings.provider
                ))
            })?;

        let config = Self::with_provider(provider, api_key, settings.model.clone());
        Ok(match &settings.api_base_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        })
    }
}

/// LLM client making one HTTP request per completion.
pub struct ApiLlmClient {
    client: Client,
    config: ApiLlmConfig,
}

impl ApiLlmClient {
    /// Create a new API client.
    pub fn new(config: ApiLlmConfig) -> Result<Self, ClusterError> {
        if config.model.trim().is_empty() {
            return Err(ClusterError::InvalidConfig(
                "missing summarizer model name".to_string(),
            ));
        }

        // Requests wait as long as the HTTP client's defaults allow
        let client = Client::builder()
            .build()
            .map_err(|e| ClusterError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send the request and turn HTTP failures into errors.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ClusterError> {
        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ClusterError::Llm(e.to_string()))?;

        if response.status() == 429 {
            return Err(ClusterError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClusterError::Llm(format!("HTTP {}: {}", status, body)));
        }

        Ok(response)
    }

    /// Make OpenAI-compatible API request.
    async fn complete_openai(&self, prompt: &str) -> Result<String, ClusterError> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            choices: Vec<OpenAIChoice>,
        }

        #[derive(Deserialize)]
        struct OpenAIChoice {
            message: OpenAIMessageResponse,
        }

        #[derive(Deserialize)]
        struct OpenAIMessageResponse {
            content: Option<String>,
        }

        let request = OpenAIRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .send(
                self.client
                    .post(self.url("chat/completions"))
                    .header(
                        "Authorization",
                        format!("Bearer {}", self.config.api_key.expose_secret()),
                    )
                    .json(&request),
            )
            .await?;

        let body: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ClusterError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClusterError::Parse("No choices in response".to_string()))
    }

    /// Make Anthropic API request.
    async fn complete_anthropic(&self, prompt: &str) -> Result<String, ClusterError> {
        #[derive(Serialize)]
        struct AnthropicRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            messages: Vec<ChatMessage<'a>>,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: Option<String>,
        }

        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .send(
                self.client
                    .post(self.url("messages"))
                    .header("x-api-key", self.config.api_key.expose_secret())
                    .header("anthropic-version", "2023-06-01")
                    .json(&request),
            )
            .await?;

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ClusterError::Parse(e.to_string()))?;

        body.content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or_else(|| ClusterError::Parse("No text content in response".to_string()))
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[async_trait]
impl LlmClient for ApiLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, ClusterError> {
        debug!(provider = ?self.config.provider, model = %self.config.model, "Calling LLM");
        match self.config.provider {
            LlmProvider::OpenAi => self.complete_openai(prompt).await,
            LlmProvider::Anthropic => self.complete_anthropic(prompt).await,
        }
    }
}
