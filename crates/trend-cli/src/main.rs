//! Trend Finder
//!
//! Embeds a sheet of cybersecurity findings and groups them into trends.
//!
//! # Usage
//!
//! ```bash
//! trend-finder embed [--source URL_OR_PATH] [--batch-size N]
//! trend-finder cluster [--eps E] [--min-samples M] [--no-headlines] [--json]
//! trend-finder status
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/trend-finder/config.toml)
//! 3. Environment variables (TREND_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use trend_cli::{
    init_logging, load_settings, run_cluster, run_embed, show_status, Cli, ClusterOptions,
    Commands,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.data_dir.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Embed { source, batch_size } => {
            run_embed(settings, source.as_deref(), batch_size).await?;
        }
        Commands::Cluster {
            eps,
            min_samples,
            no_headlines,
            json,
            source,
        } => {
            run_cluster(
                settings,
                ClusterOptions {
                    eps,
                    min_samples,
                    no_headlines,
                    json,
                    source,
                },
            )
            .await?;
        }
        Commands::Status => {
            show_status(&settings)?;
        }
    }

    Ok(())
}
