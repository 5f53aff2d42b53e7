//! Configuration loading for the trend finder.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/trend-finder/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TrendError;

/// Published findings sheet, exported as CSV.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRcLWviAhPQSQ1iKYxFF1EjVpIWpzKv-Hfsw3KXPnvwMLA_F42y5aHAGhBJnHimMgeYoUqorn5WKqvH/pub?output=csv";

/// Embedding stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Rows submitted per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fixed wait after a failed batch, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key (falls back to OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,
}

fn default_batch_size() -> usize {
    100
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            retry_delay_secs: default_retry_delay_secs(),
            model: default_embedding_model(),
            api_key: None,
            api_base_url: None,
        }
    }
}

/// Density clustering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringSettings {
    /// Maximum cosine distance between neighbours
    #[serde(default = "default_eps")]
    pub eps: f64,

    /// Neighbourhood size (self included) for a core point
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_eps() -> f64 {
    0.15
}

fn default_min_samples() -> usize {
    2
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            eps: default_eps(),
            min_samples: default_min_samples(),
        }
    }
}

/// Headline summarizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    /// Provider name ("openai" or "anthropic")
    #[serde(default = "default_summarizer_provider")]
    pub provider: String,

    /// Model name (e.g., "gpt-4", "claude-3-haiku-20240307")
    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// API key (loaded from env var, not stored in config file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Texts sampled from each cluster into the prompt
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// What the findings are, as phrased in the prompt
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_summarizer_provider() -> String {
    "openai".to_string()
}

fn default_summarizer_model() -> String {
    "gpt-4".to_string()
}

fn default_max_samples() -> usize {
    10
}

fn default_subject() -> String {
    "cybersecurity findings".to_string()
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            provider: default_summarizer_provider(),
            model: default_summarizer_model(),
            api_key: None,
            api_base_url: None,
            max_samples: default_max_samples(),
            subject: default_subject(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// CSV source: http(s) URL or local path
    #[serde(default = "default_source")]
    pub source: String,

    /// Directory holding the embedding artifacts
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Checkpoint file name inside `data_dir`
    #[serde(default = "default_partial_file")]
    pub partial_file: String,

    /// Final artifact file name inside `data_dir`
    #[serde(default = "default_final_file")]
    pub final_file: String,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Clustering configuration
    #[serde(default)]
    pub clustering: ClusteringSettings,

    /// Summarizer configuration
    #[serde(default)]
    pub summarizer: SummarizerSettings,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_source() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_partial_file() -> String {
    "precomputed_embeddings_partial.bin".to_string()
}

fn default_final_file() -> String {
    "precomputed_embeddings.bin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: default_source(),
            data_dir: default_data_dir(),
            partial_file: default_partial_file(),
            final_file: default_final_file(),
            embedding: EmbeddingSettings::default(),
            clustering: ClusteringSettings::default(),
            summarizer: SummarizerSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/trend-finder/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (TREND_*, nested keys joined by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TrendError> {
        let config_dir = ProjectDirs::from("", "", "trend-finder")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("source", default_source())
            .map_err(|e| TrendError::Config(e.to_string()))?
            .set_default("data_dir", default_data_dir())
            .map_err(|e| TrendError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TrendError::Config(e.to_string()))?
            .set_default("embedding.batch_size", default_batch_size() as i64)
            .map_err(|e| TrendError::Config(e.to_string()))?
            .set_default("clustering.eps", default_eps())
            .map_err(|e| TrendError::Config(e.to_string()))?
            .set_default("clustering.min_samples", default_min_samples() as i64)
            .map_err(|e| TrendError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // TREND_DATA_DIR, TREND_CLUSTERING__EPS, TREND_SUMMARIZER__MODEL, ...
        builder = builder.add_source(
            Environment::with_prefix("TREND")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TrendError::Config(e.to_string()))?;

        let mut settings: Settings = config
            .try_deserialize()
            .map_err(|e| TrendError::Config(e.to_string()))?;

        settings.apply_key_fallbacks();
        Ok(settings)
    }

    /// Fill missing API keys from the provider's conventional env var.
    fn apply_key_fallbacks(&mut self) {
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.summarizer.api_key.is_none() {
            let var = match self.summarizer.provider.as_str() {
                "anthropic" => "ANTHROPIC_API_KEY",
                _ => "OPENAI_API_KEY",
            };
            self.summarizer.api_key = std::env::var(var).ok();
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), TrendError> {
        if self.embedding.batch_size == 0 {
            return Err(TrendError::Config("embedding.batch_size must be > 0".into()));
        }
        if !(self.clustering.eps > 0.0 && self.clustering.eps <= 1.0) {
            return Err(TrendError::Config(format!(
                "clustering.eps must be in (0, 1], got {}",
                self.clustering.eps
            )));
        }
        if self.clustering.min_samples == 0 {
            return Err(TrendError::Config(
                "clustering.min_samples must be > 0".into(),
            ));
        }
        if self.summarizer.max_samples == 0 {
            return Err(TrendError::Config(
                "summarizer.max_samples must be > 0".into(),
            ));
        }
        match self.summarizer.provider.as_str() {
            "openai" | "anthropic" => Ok(()),
            other => Err(TrendError::Config(format!(
                "unknown summarizer provider: {other}"
            ))),
        }
    }

    /// Directory holding the artifacts, with `~/` expanded
    pub fn expanded_data_dir(&self) -> PathBuf {
        if let Some(rest) = self.data_dir.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new() {
                return home.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.data_dir)
    }

    /// Full path of the checkpoint file
    pub fn partial_path(&self) -> PathBuf {
        self.expanded_data_dir().join(&self.partial_file)
    }

    /// Full path of the final artifact
    pub fn final_path(&self) -> PathBuf {
        self.expanded_data_dir().join(&self.final_file)
    }
}
