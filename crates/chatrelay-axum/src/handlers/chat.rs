//! OpenAI-compatible chat completion gateway.

use axum::Json;
use axum::extract::State;
use bytes::Bytes;
use chatrelay_core::{ChatCompletionRequest, ChatCompletionResponse, RelayError};
use chatrelay_scheduler::Admission;
use chrono::Utc;
use tracing::{debug, info};

use crate::error::HttpError;
use crate::state::AppState;

/// `POST /v1/chat/completions`.
///
/// Answers exactly once: with the completion, or with the failure that
/// ended the request.
pub async fn completions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatCompletionResponse>, HttpError> {
    let request: ChatCompletionRequest = serde_json::from_slice(&body)
        .map_err(|e| HttpError::BadRequest(format!("Invalid request body: {e}")))?;
    request.validate()?;

    let id = state.scheduler.next_request_id();
    let model = request.model.clone();
    let messages = request.messages.len();
    let (chat, completion) = request.into_chat_request(id);

    match state.scheduler.submit(chat) {
        Admission::Queued { position } => {
            info!(request_id = %id, model = %model, position, "Chat completion queued");
        }
        admission => {
            debug!(request_id = %id, model = %model, messages, ?admission, "Chat completion admitted");
        }
    }

    let outcome = completion
        .await
        .map_err(|_| RelayError::Internal("request was dropped before completion".to_string()))?;
    let completion = outcome?;

    Ok(Json(ChatCompletionResponse::from_completion(
        id,
        &model,
        Utc::now().timestamp(),
        &completion,
    )))
}
