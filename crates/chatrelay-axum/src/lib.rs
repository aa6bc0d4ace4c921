//! Axum adapter for chatrelay.
//!
//! Serves the OpenAI-compatible chat endpoint, the health and admin
//! endpoints, and the WebSocket the worker connects to.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod worker_hub;

// Re-export primary types
pub use bootstrap::{AppContext, CorsConfig, ServerOptions, serve, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
pub use worker_hub::{ConnectionId, HubStatus, WorkerHub};
