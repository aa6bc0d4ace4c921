//! Top-level commands.

use clap::{Args, Subcommand};

use chatrelay_core::AdmissionPolicy;

use crate::config_commands::ConfigCommand;

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the relay server
    Serve(ServeArgs),

    /// View or change the persisted config
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Options for `chatrelay serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "CHATRELAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind for this run (the saved port is used when omitted)
    #[arg(long, env = "CHATRELAY_PORT")]
    pub port: Option<u16>,

    /// Save a new per-request timeout before starting
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    /// Save a new admission policy (`queue` or `drop`) before starting
    #[arg(long)]
    pub admission_policy: Option<AdmissionPolicy>,

    /// Restrict CORS to these origins (repeatable; all origins when omitted)
    #[arg(long = "allowed-origin")]
    pub allowed_origins: Vec<String>,
}
