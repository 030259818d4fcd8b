//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for shopsync using clap.
//!
//! Exit codes: 0 success, 1 partial failure, 2 configuration error,
//! 5 fatal error, 130 interrupted.

pub mod commands;

use clap::{Parser, Subcommand};

/// shopsync - Shopify bulk export orchestrator
#[derive(Parser, Debug)]
#[command(name = "shopsync")]
#[command(version, about, long_about = None)]
#[command(author = "Shopsync Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "shopsync.toml", env = "SHOPSYNC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SHOPSYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run bulk exports for the configured entities
    Sync(commands::sync::SyncArgs),

    /// Show per-entity sync checkpoints
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Rebuild nested records from a downloaded artifact, offline
    Reconstruct(commands::reconstruct::ReconstructArgs),
}
