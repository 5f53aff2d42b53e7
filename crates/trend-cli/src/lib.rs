//! Trend finder library exports.
//!
//! This crate provides the `trend-finder` binary.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (embed, cluster, status)
//! - `report`: Text and JSON trend reports

pub mod cli;
pub mod commands;
pub mod report;

pub use cli::{Cli, Commands};
pub use commands::{
    init_logging, load_settings, run_cluster, run_embed, show_status, summarize_all,
    ClusterOptions,
};
pub use report::{ReportEntry, TrendGroup, TrendReport, NO_TRENDS};
