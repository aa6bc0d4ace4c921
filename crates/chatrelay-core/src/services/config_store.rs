//! Config store - publishes config snapshots and orchestrates updates.
//!
//! Readers take an `Arc<ServerConfig>` snapshot; writers build a new config
//! and swap the pointer. A snapshot is never mutated in place, so a reader
//! can never observe a half-applied update.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{AdmissionPolicy, ServerConfig, ServerConfigUpdate, validate_config};
use crate::ports::{ConfigRepository, CoreError};

/// Result of applying a config update.
#[derive(Debug, Clone)]
pub struct ConfigUpdateOutcome {
    /// The config now in effect.
    pub config: Arc<ServerConfig>,
    /// Whether this update changed the port (applies after restart).
    pub restart_required: bool,
}

/// Holds the current config and persists changes.
pub struct ConfigStore {
    repo: Arc<dyn ConfigRepository>,
    current: RwLock<Arc<ServerConfig>>,
    /// Serializes read-merge-save cycles.
    update_lock: Mutex<()>,
}

impl ConfigStore {
    /// Create a store seeded with an already-loaded config.
    pub fn new(repo: Arc<dyn ConfigRepository>, config: ServerConfig) -> Self {
        Self {
            repo,
            current: RwLock::new(Arc::new(config)),
            update_lock: Mutex::new(()),
        }
    }

    /// Load the persisted config and create a store around it.
    pub async fn load(repo: Arc<dyn ConfigRepository>) -> Result<Self, CoreError> {
        let config = repo.load().await?;
        validate_config(&config)?;
        info!(
            target: "chatrelay.config",
            port = config.port,
            request_timeout_ms = config.request_timeout_ms,
            admission_policy = %config.admission_policy,
            "Config loaded"
        );
        Ok(Self::new(repo, config))
    }

    /// Current config snapshot.
    pub fn snapshot(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Current per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.snapshot().request_timeout()
    }

    /// Current admission policy.
    pub fn admission_policy(&self) -> AdmissionPolicy {
        self.snapshot().admission_policy
    }

    /// Apply a partial update: merge, validate, persist, then publish.
    ///
    /// Nothing is published if validation or persistence fails.
    pub async fn update(&self, update: ServerConfigUpdate) -> Result<ConfigUpdateOutcome, CoreError> {
        let _guard = self.update_lock.lock().await;

        let mut next = (*self.snapshot()).clone();
        let port_changed = next.merge(&update);
        if port_changed {
            next.last_restart_request_timestamp = Some(Utc::now());
        }
        validate_config(&next)?;
        self.repo.save(&next).await?;

        let published = Arc::new(next);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&published);

        info!(
            target: "chatrelay.config",
            port = published.port,
            request_timeout_ms = published.request_timeout_ms,
            admission_policy = %published.admission_policy,
            restart_required = port_changed,
            "Config updated"
        );

        Ok(ConfigUpdateOutcome {
            config: published,
            restart_required: port_changed,
        })
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &self.snapshot())
            .finish_non_exhaustive()
    }
}
