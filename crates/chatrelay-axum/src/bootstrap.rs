//! Axum server bootstrap - the composition root.
//!
//! This module is the only place where the scheduler, the worker hub and the
//! config store are wired together.

use std::sync::Arc;

use anyhow::Result;
use chatrelay_core::ConfigStore;
use chatrelay_scheduler::Scheduler;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::routes::create_router;
use crate::worker_hub::WorkerHub;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins.
    #[default]
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

/// Listener options that are not part of the persisted config.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Interface to bind.
    pub host: String,
    /// Bind this port instead of the configured one.
    pub port: Option<u16>,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            cors: CorsConfig::default(),
        }
    }
}

/// Everything a handler needs.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<ConfigStore>,
    pub scheduler: Arc<Scheduler>,
    pub workers: Arc<WorkerHub>,
    /// Port this process actually listens on.
    pub listening_port: u16,
    pub started_at: DateTime<Utc>,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

impl AppContext {
    /// Wire a fresh worker hub and scheduler around `config`.
    pub fn new(config: Arc<ConfigStore>, listening_port: u16, shutdown: CancellationToken) -> Self {
        let workers = Arc::new(WorkerHub::new());
        let scheduler = Scheduler::new(workers.clone(), Arc::clone(&config));
        Self {
            config,
            scheduler,
            workers,
            listening_port,
            started_at: Utc::now(),
            shutdown,
        }
    }
}

/// Bind the configured address and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: Arc<ConfigStore>,
    options: ServerOptions,
    shutdown: CancellationToken,
) -> Result<()> {
    let port = options.port.unwrap_or(config.snapshot().port);
    let listener = TcpListener::bind((options.host.as_str(), port)).await?;
    serve(listener, config, &options.cors, shutdown).await
}

/// Serve on a pre-bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    config: Arc<ConfigStore>,
    cors: &CorsConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    let snapshot = config.snapshot();
    let ctx = AppContext::new(config, addr.port(), shutdown.clone());
    let app = create_router(ctx, cors);

    info!(
        request_timeout_ms = snapshot.request_timeout_ms,
        admission_policy = %snapshot.admission_policy,
        "chatrelay listening on http://{addr}"
    );
    info!("Workers connect to ws://{addr}/ws");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("chatrelay shut down");
    Ok(())
}
