//! Server configuration model and validation.
//!
//! Pure domain types with no infrastructure dependencies. Persistence lives
//! behind [`crate::ports::ConfigRepository`]; publication of snapshots lives in
//! [`crate::services::ConfigStore`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default listening port for the relay.
pub const DEFAULT_PORT: u16 = 8787;

/// Default per-request timeout, measured from dispatch.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Upper bound accepted for `request_timeout_ms` (one hour).
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 3_600_000;

/// What to do with a request that arrives while the worker slot is occupied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Wait in FIFO order for the slot to free.
    #[default]
    Queue,
    /// Reject immediately with a busy failure.
    Drop,
}

impl AdmissionPolicy {
    /// Lowercase name used on the wire and in config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Drop => "drop",
        }
    }
}

impl fmt::Display for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdmissionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "drop" => Ok(Self::Drop),
            other => Err(ConfigError::InvalidAdmissionPolicy(other.to_string())),
        }
    }
}

/// Relay configuration.
///
/// Every field except `port` takes effect immediately when updated; a port
/// change is recorded and applies on the next restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Port the HTTP server listens on.
    pub port: u16,

    /// How long a dispatched request may wait for a terminal worker event.
    pub request_timeout_ms: u64,

    /// Behaviour when the worker slot is occupied.
    pub admission_policy: AdmissionPolicy,

    /// When a restart was last requested (set by port changes).
    pub last_restart_request_timestamp: Option<DateTime<Utc>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ServerConfig {
    /// Create a config with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            port: DEFAULT_PORT,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            admission_policy: AdmissionPolicy::Queue,
            last_restart_request_timestamp: None,
        }
    }

    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Merge a partial update into this config.
    ///
    /// Returns `true` when the port changed.
    pub fn merge(&mut self, update: &ServerConfigUpdate) -> bool {
        let mut port_changed = false;
        if let Some(port) = update.port {
            port_changed = port != self.port;
            self.port = port;
        }
        if let Some(timeout_ms) = update.request_timeout_ms {
            self.request_timeout_ms = timeout_ms;
        }
        if let Some(policy) = update.admission_policy {
            self.admission_policy = policy;
        }
        port_changed
    }
}

/// Partial config update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigUpdate {
    pub port: Option<u16>,
    pub request_timeout_ms: Option<u64>,
    pub admission_policy: Option<AdmissionPolicy>,
}

impl ServerConfigUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.port.is_none() && self.request_timeout_ms.is_none() && self.admission_policy.is_none()
    }
}

/// Config validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("Request timeout must be between 1 and 3600000 ms, got {0}")]
    InvalidTimeout(u64),

    #[error("Admission policy must be `queue` or `drop`, got `{0}`")]
    InvalidAdmissionPolicy(String),
}

/// Validate config values.
pub fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.port < 1024 {
        return Err(ConfigError::InvalidPort(config.port));
    }

    if !(1..=MAX_REQUEST_TIMEOUT_MS).contains(&config.request_timeout_ms) {
        return Err(ConfigError::InvalidTimeout(config.request_timeout_ms));
    }

    Ok(())
}
