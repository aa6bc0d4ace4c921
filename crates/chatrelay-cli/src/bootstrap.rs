//! CLI bootstrap - the composition root.
//!
//! Resolves the config file and loads it into a [`ConfigStore`]. Command
//! handlers receive the resulting [`CliContext`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chatrelay_core::{ConfigStore, JsonFileConfigRepository, default_config_path};
use tracing::debug;

/// Fully composed context for CLI commands.
#[derive(Debug)]
pub struct CliContext {
    config_path: PathBuf,
    config: Arc<ConfigStore>,
}

impl CliContext {
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub const fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }
}

/// Load the config from `config_path`, or from the default location.
pub async fn bootstrap(config_path: Option<PathBuf>) -> Result<CliContext> {
    let config_path = match config_path {
        Some(path) => path,
        None => default_config_path().context("Failed to resolve the default config path")?,
    };
    debug!(config_path = %config_path.display(), "Resolved config path");

    let repo = Arc::new(JsonFileConfigRepository::new(config_path.clone()));
    let config = ConfigStore::load(repo)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    Ok(CliContext {
        config_path,
        config: Arc::new(config),
    })
}
