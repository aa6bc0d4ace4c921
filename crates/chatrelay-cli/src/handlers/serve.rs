//! Serve command handler.
//!
//! Applies any saved-setting overrides, then runs the relay until Ctrl-C.

use anyhow::Result;
use chatrelay_axum::{CorsConfig, ServerOptions, start_server};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::commands::ServeArgs;
use crate::handlers::config::build_update;

/// Execute the serve command.
pub async fn execute(ctx: &CliContext, args: ServeArgs) -> Result<()> {
    // --port only affects this run; the others are saved like `config set`
    if let Some(update) = build_update(None, args.request_timeout_ms, args.admission_policy) {
        ctx.config().update(update).await?;
    }

    let options = server_options(args);
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl-C, shutting down"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
            shutdown.cancel();
        }
    });

    start_server(ctx.config().clone(), options, shutdown).await
}

fn server_options(args: ServeArgs) -> ServerOptions {
    let cors = if args.allowed_origins.is_empty() {
        CorsConfig::AllowAll
    } else {
        CorsConfig::AllowOrigins(args.allowed_origins)
    };
    ServerOptions {
        host: args.host,
        port: args.port,
        cors,
    }
}
