//! Response bodies for the health and admin endpoints.

use chatrelay_core::ServerConfig;
use chatrelay_scheduler::SchedulerSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::worker_hub::HubStatus;

/// `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub active_worker_connections: usize,
    pub total_tracked_connections: usize,
    pub transport_state: &'static str,
}

impl HealthResponse {
    pub fn from_hub(hub: &HubStatus) -> Self {
        let connected = hub.is_connected();
        Self {
            status: "ok",
            timestamp: Utc::now(),
            active_worker_connections: usize::from(connected),
            total_tracked_connections: hub.total_connections,
            transport_state: if connected { "connected" } else { "disconnected" },
        }
    }
}

/// `GET /admin/server-info`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfoResponse {
    pub version: &'static str,
    pub config: ServerConfig,
    pub listening_port: u16,
    /// A port change was saved after this process started.
    pub restart_required: bool,
    pub started_at: DateTime<Utc>,
    pub workers: HubStatus,
    pub scheduler: SchedulerSnapshot,
}

/// `POST /admin/update-settings`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsResponse {
    pub success: bool,
    pub config: ServerConfig,
    pub restart_required: bool,
    pub message: String,
}
