//! Admin handlers: read and update the server config.

use axum::Json;
use axum::extract::State;
use bytes::Bytes;
use chatrelay_core::ServerConfigUpdate;
use tracing::debug;

use crate::dto::{ServerInfoResponse, UpdateSettingsResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// `GET /admin/server-info`.
pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    let config = state.config.snapshot();
    let restart_required = config
        .last_restart_request_timestamp
        .is_some_and(|requested| requested >= state.started_at);

    Json(ServerInfoResponse {
        version: env!("CARGO_PKG_VERSION"),
        config: (*config).clone(),
        listening_port: state.listening_port,
        restart_required,
        started_at: state.started_at,
        workers: state.workers.status(),
        scheduler: state.scheduler.snapshot(),
    })
}

/// `POST /admin/update-settings`.
///
/// Timeout and policy changes apply to the next decision the scheduler
/// makes. A port change is only saved.
pub async fn update_settings(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpdateSettingsResponse>, HttpError> {
    let update: ServerConfigUpdate = serde_json::from_slice(&body)
        .map_err(|e| HttpError::BadRequest(format!("Invalid settings body: {e}")))?;
    debug!(?update, "POST /admin/update-settings");

    if update.is_empty() {
        return Err(HttpError::BadRequest("No settings provided".to_string()));
    }

    let outcome = state.config.update(update).await?;
    let message = if outcome.restart_required {
        "Settings saved. Restart the server to apply the new port."
    } else {
        "Settings applied."
    };

    Ok(Json(UpdateSettingsResponse {
        success: true,
        config: (*outcome.config).clone(),
        restart_required: outcome.restart_required,
        message: message.to_string(),
    }))
}
