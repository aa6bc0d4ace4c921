//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Relay OpenAI-style chat completions to a single connected worker.
#[derive(Debug, Parser)]
#[command(name = "chatrelay")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (defaults to <data dir>/chatrelay/config.json)
    #[arg(long = "config", env = "CHATRELAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `chatrelay.scheduler=trace` (overrides RUST_LOG)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
