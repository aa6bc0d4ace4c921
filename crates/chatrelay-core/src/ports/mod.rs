//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No transport types (WebSocket frames, HTTP bodies) in any signature
//! - No filesystem implementation details
//! - The worker channel is synchronous: sending never awaits

pub mod config_repository;
pub mod worker_channel;

use thiserror::Error;

pub use config_repository::ConfigRepository;
pub use worker_channel::{WorkerChannel, WorkerSendError};

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details and
/// provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage backend error (filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters should map this to their own error types (HTTP status codes,
/// CLI exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Config validation failed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
