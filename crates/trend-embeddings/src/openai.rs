//! Embedding service backed by an OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingService, ModelInfo};

/// Default API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI embedding client.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// Model to use (e.g., "text-embedding-ada-002")
    pub model: String,

    /// API key
    pub api_key: SecretString,
}

impl OpenAiEmbeddingConfig {
    /// Create config for the public OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Known output dimensions of the hosted models.
fn known_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-ada-002" | "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embedding client.
///
/// Makes a single attempt per batch; the batch embedder owns the retry policy.
pub struct OpenAiEmbeddingService {
    client: Client,
    config: OpenAiEmbeddingConfig,
    info: ModelInfo,
}

impl OpenAiEmbeddingService {
    /// Create a new embedding client.
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(EmbeddingError::Config("missing OpenAI API key".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(EmbeddingError::Config("missing embedding model name".to_string()));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;
        let info = ModelInfo::new(config.model.clone(), known_dimension(&config.model));

        Ok(Self {
            client,
            config,
            info,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbeddingService {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = texts.len(), model = %self.config.model, "Requesting embeddings");

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Api(e.to_string()))?;

        if response.status() == 429 {
            return Err(EmbeddingError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("HTTP {}: {}", status, body)));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;

        // The API tags each vector with its input position
        body.data.sort_by_key(|d| d.index);
        if let Some((expected, d)) = body
            .data
            .iter()
            .enumerate()
            .find(|(i, d)| d.index != *i)
        {
            return Err(EmbeddingError::Parse(format!(
                "response indices are not 0..{}: expected index {expected}, got {}",
                body.data.len(),
                d.index
            )));
        }

        Ok(body
            .data
            .into_iter()
            .map(|d| Embedding::from_raw(d.embedding))
            .collect())
    }
}
