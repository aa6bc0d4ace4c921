//! Configuration management subcommands.

use clap::Subcommand;

use chatrelay_core::AdmissionPolicy;

/// Config command variants.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the persisted config
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update the persisted config
    Set {
        /// Port for the relay server (>= 1024, applies on next start)
        #[arg(long)]
        port: Option<u16>,
        /// Per-request timeout in milliseconds (1-3600000)
        #[arg(long)]
        request_timeout_ms: Option<u64>,
        /// Behaviour when the worker is busy: `queue` or `drop`
        #[arg(long)]
        admission_policy: Option<AdmissionPolicy>,
    },
    /// Print the config file location
    Path,
}
