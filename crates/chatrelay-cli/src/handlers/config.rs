//! Config command handler.

use anyhow::Result;
use chatrelay_core::{AdmissionPolicy, ServerConfig, ServerConfigUpdate};

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;

/// Execute the config command.
pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show { json } => {
            let config = ctx.config().snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&*config)?);
            } else {
                print_config(&config);
            }
            Ok(())
        }
        ConfigCommand::Set {
            port,
            request_timeout_ms,
            admission_policy,
        } => {
            let Some(update) = build_update(port, request_timeout_ms, admission_policy) else {
                println!("No settings provided. Use --help to see available options.");
                return Ok(());
            };

            let outcome = ctx.config().update(update).await?;
            println!("✓ Config saved to {}", ctx.config_path().display());
            print_config(&outcome.config);
            if outcome.restart_required {
                println!();
                println!("Restart the server to listen on port {}.", outcome.config.port);
            }
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.config_path().display());
            Ok(())
        }
    }
}

/// Collect the provided flags into an update, or `None` if nothing was set.
pub fn build_update(
    port: Option<u16>,
    request_timeout_ms: Option<u64>,
    admission_policy: Option<AdmissionPolicy>,
) -> Option<ServerConfigUpdate> {
    let update = ServerConfigUpdate {
        port,
        request_timeout_ms,
        admission_policy,
    };
    (!update.is_empty()).then_some(update)
}

fn print_config(config: &ServerConfig) {
    println!("Current config:");
    println!("  port:                 {}", config.port);
    println!("  request_timeout_ms:   {}", config.request_timeout_ms);
    println!("  admission_policy:     {}", config.admission_policy);
    match config.last_restart_request_timestamp {
        Some(at) => println!("  last_restart_request: {}", at.to_rfc3339()),
        None => println!("  last_restart_request: never"),
    }
}
