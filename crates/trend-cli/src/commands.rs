//! Command implementations for the trend finder.
//!
//! Handles:
//! - embed: Load findings, embed them in checkpointed batches
//! - cluster: Load the final artifact, cluster, write headlines, print report
//! - status: Show checkpoint and final artifact state

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use trend_clusters::{
    ApiLlmClient, ApiLlmConfig, Cluster, ClusterSummarizer, ClusteringConfig, LlmClient,
    SimilarityClusterer, SummaryConfig,
};
use trend_embeddings::{
    ArtifactStore, BatchConfig, BatchEmbedder, EmbedOutcome, EmbeddingService,
    OpenAiEmbeddingConfig, OpenAiEmbeddingService,
};
use trend_ingest::load_findings;
use trend_types::Settings;

use crate::report::TrendReport;

/// Options of the `cluster` command.
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    pub eps: Option<f64>,
    pub min_samples: Option<usize>,
    pub no_headlines: bool,
    pub json: bool,
    pub source: Option<String>,
}

/// Load configuration and apply global CLI overrides.
pub fn load_settings(
    config_path: Option<&str>,
    data_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(data_dir) = data_dir_override {
        settings.data_dir = data_dir.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }

    Ok(settings)
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn artifact_store(settings: &Settings) -> ArtifactStore {
    ArtifactStore::new(settings.partial_path(), settings.final_path())
}

fn embedding_service(settings: &Settings) -> Result<Arc<dyn EmbeddingService>> {
    let api_key = settings
        .embedding
        .api_key
        .clone()
        .context("No embedding API key; set OPENAI_API_KEY or TREND_EMBEDDING__API_KEY")?;

    let mut config = OpenAiEmbeddingConfig::new(api_key, settings.embedding.model.clone());
    if let Some(url) = &settings.embedding.api_base_url {
        config = config.with_base_url(url.clone());
    }

    let service =
        OpenAiEmbeddingService::new(config).context("Failed to create embedding client")?;
    Ok(Arc::new(service))
}

fn llm_client(settings: &Settings) -> Result<Arc<dyn LlmClient>> {
    let config = ApiLlmConfig::from_settings(&settings.summarizer)
        .context("Summarizer is not configured; pass --no-headlines to skip headlines")?;
    let client = ApiLlmClient::new(config).context("Failed to create LLM client")?;
    Ok(Arc::new(client))
}

/// Embed every finding of the source, resuming from any checkpoint.
pub async fn run_embed(
    mut settings: Settings,
    source_override: Option<&str>,
    batch_size_override: Option<usize>,
) -> Result<EmbedOutcome> {
    if let Some(source) = source_override {
        settings.source = source.to_string();
    }
    if let Some(batch_size) = batch_size_override {
        settings.embedding.batch_size = batch_size;
    }
    settings.validate().context("Invalid configuration")?;

    info!(source = %settings.source, "Loading findings");
    let findings = load_findings(&settings.source)
        .await
        .with_context(|| format!("Failed to load findings from {}", settings.source))?;
    let texts: Vec<String> = findings.into_iter().map(|f| f.text).collect();

    let service = embedding_service(&settings)?;
    let config = BatchConfig {
        batch_size: settings.embedding.batch_size,
        retry_delay: Duration::from_secs(settings.embedding.retry_delay_secs),
    };
    let embedder = BatchEmbedder::new(service, artifact_store(&settings), config)?;

    let outcome = embedder.run(&texts).await.context("Embedding run failed")?;
    print_outcome(&outcome, &settings);
    Ok(outcome)
}

fn print_outcome(outcome: &EmbedOutcome, settings: &Settings) {
    println!(
        "Processed {} findings in {} batches ({} embedded, {} already done, {} failed)",
        outcome.total_rows,
        outcome.batches,
        outcome.embedded,
        outcome.skipped,
        outcome.failed.len()
    );

    if outcome.is_complete() {
        println!("Embeddings saved to {:?}", settings.final_path());
        return;
    }

    for range in &outcome.failed {
        println!("  Failed rows {}..{}", range.start, range.end);
    }
    println!(
        "Progress kept in {:?}. Run `trend-finder embed` again to retry the missing batches.",
        settings.partial_path()
    );
}

/// Cluster the embedded findings and print the trend report.
pub async fn run_cluster(mut settings: Settings, options: ClusterOptions) -> Result<TrendReport> {
    if let Some(eps) = options.eps {
        settings.clustering.eps = eps;
    }
    if let Some(min_samples) = options.min_samples {
        settings.clustering.min_samples = min_samples;
    }
    settings.validate().context("Invalid configuration")?;

    let artifact = artifact_store(&settings)
        .load_final()
        .context("Failed to load precomputed embeddings")?;
    info!(
        rows = artifact.len(),
        model = %artifact.model,
        "Loaded precomputed embeddings"
    );

    let clusterer = SimilarityClusterer::new(ClusteringConfig::from(&settings.clustering))?;
    let clusters = clusterer.cluster(&artifact.embeddings())?;

    let texts = artifact.texts();
    let headlines = if options.no_headlines || clusters.is_empty() {
        vec![None; clusters.len()]
    } else {
        let summarizer =
            ClusterSummarizer::new(llm_client(&settings)?, SummaryConfig::from(&settings.summarizer));
        summarize_all(&summarizer, &clusters, &texts).await
    };

    let provenance = match &options.source {
        Some(source) => Some(
            load_findings(source)
                .await
                .with_context(|| format!("Failed to load findings from {source}"))?,
        ),
        None => None,
    };

    let report = TrendReport::build(
        &artifact.records,
        &clusters,
        &headlines,
        provenance.as_deref(),
    );

    if options.json {
        println!("{}", report.to_json().context("Failed to encode report")?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(report)
}

/// One headline per cluster; a failed cluster gets `None`.
pub async fn summarize_all(
    summarizer: &ClusterSummarizer,
    clusters: &[Cluster],
    texts: &[&str],
) -> Vec<Option<String>> {
    let mut headlines = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        let members = cluster.texts(texts);
        match summarizer.headline(&members).await {
            Ok(headline) => headlines.push(Some(headline)),
            Err(e) => {
                warn!(label = cluster.label, error = %e, "Failed to summarize cluster");
                headlines.push(None);
            }
        }
    }
    headlines
}

/// Show checkpoint and final artifact state.
pub fn show_status(settings: &Settings) -> Result<()> {
    let store = artifact_store(settings);
    let status = store.status().context("Failed to read artifacts")?;

    match status.partial_rows {
        Some(rows) => println!("Checkpoint: {rows} rows in {:?}", store.partial_path()),
        None => println!("Checkpoint: none"),
    }
    match status.final_rows {
        Some(rows) => println!("Final embeddings: {rows} rows in {:?}", store.final_path()),
        None => println!("Final embeddings: not found; run `trend-finder embed`"),
    }

    Ok(())
}
