//! JSON file-backed config repository.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::config::ServerConfig;
use crate::ports::{ConfigRepository, RepositoryError};

/// Stores the config as pretty-printed JSON.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated config behind.
#[derive(Debug, Clone)]
pub struct JsonFileConfigRepository {
    path: PathBuf,
}

impl JsonFileConfigRepository {
    /// Create a repository for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigRepository for JsonFileConfigRepository {
    async fn load(&self) -> Result<ServerConfig, RepositoryError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    target: "chatrelay.config",
                    path = %self.path.display(),
                    "No config file yet, using defaults"
                );
                return Ok(ServerConfig::with_defaults());
            }
            Err(e) => {
                return Err(RepositoryError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| RepositoryError::Serialization(format!("{}: {e}", self.path.display())))
    }

    async fn save(&self, config: &ServerConfig) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    RepositoryError::Storage(format!(
                        "failed to create {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, json).await.map_err(|e| {
            RepositoryError::Storage(format!("failed to write {}: {e}", temp.display()))
        })?;
        fs::rename(&temp, &self.path).await.map_err(|e| {
            RepositoryError::Storage(format!(
                "failed to move {} into place: {e}",
                temp.display()
            ))
        })?;

        debug!(target: "chatrelay.config", path = %self.path.display(), "Config saved");
        Ok(())
    }
}
