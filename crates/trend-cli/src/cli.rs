//! CLI argument parsing for the trend finder.
//!
//! Flags override every other configuration source.

use clap::{Parser, Subcommand};

/// Trend Finder
///
/// Embeds a sheet of findings once, then groups them into trends.
#[derive(Parser, Debug)]
#[command(name = "trend-finder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/trend-finder/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Directory holding the embedding artifacts
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Trend finder commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed every finding, resuming from the last checkpoint
    Embed {
        /// CSV source, URL or local path
        #[arg(short, long)]
        source: Option<String>,

        /// Rows per embedding request
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Cluster the embedded findings and print the trends
    Cluster {
        /// Maximum cosine distance between neighbours
        #[arg(long)]
        eps: Option<f64>,

        /// Neighbours (self included) needed for a dense point
        #[arg(long)]
        min_samples: Option<usize>,

        /// Skip LLM headlines
        #[arg(long)]
        no_headlines: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// CSV source to show resource name, date and link next to each finding
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Show checkpoint and final artifact state
    Status,
}
