//! Config repository trait definition.
//!
//! This port defines the interface for persisting the relay configuration.
//! Implementations handle all storage details internally.

use async_trait::async_trait;

use super::RepositoryError;
use crate::config::ServerConfig;

/// Repository for relay configuration persistence.
///
/// # Design Rules
///
/// - Works with the domain `ServerConfig` type directly
/// - Implementation handles JSON serialization internally
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Load the config.
    ///
    /// Returns default config if none is stored.
    async fn load(&self) -> Result<ServerConfig, RepositoryError>;

    /// Save the config.
    async fn save(&self, config: &ServerConfig) -> Result<(), RepositoryError>;
}
