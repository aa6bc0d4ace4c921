//! In-memory config repository.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::config::ServerConfig;
use crate::ports::{ConfigRepository, RepositoryError};

/// Keeps the config in process memory.
#[derive(Debug, Default)]
pub struct InMemoryConfigRepository {
    config: Mutex<ServerConfig>,
}

impl InMemoryConfigRepository {
    /// Create a repository seeded with `config`.
    pub const fn new(config: ServerConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn load(&self) -> Result<ServerConfig, RepositoryError> {
        Ok(self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save(&self, config: &ServerConfig) -> Result<(), RepositoryError> {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        Ok(())
    }
}
