//! Wire protocol between the relay and its worker.
//!
//! Messages are JSON objects tagged by a `type` field:
//!
//! | Direction | `type` | Fields |
//! |---|---|---|
//! | Relay → Worker | `DISPATCH` | `requestId`, `payload`, `settings` |
//! | Worker → Relay | `CHUNK` | `requestId`, `text`, `isFinal` |
//! | Worker → Relay | `STREAM_ENDED` | `requestId` |
//! | Worker → Relay | `ERROR` | `requestId`, `message` |
//! | Worker → Relay | `RESPONSE` | `requestId`, `text`, `isFinal` (legacy, non-streaming) |

use serde::{Deserialize, Serialize};

use super::request::{GenerationSettings, RequestId};
use crate::errors::WorkerEventError;

/// Instruction sent to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerCommand {
    /// Execute one chat request.
    #[serde(rename_all = "camelCase")]
    Dispatch {
        request_id: RequestId,
        payload: serde_json::Value,
        settings: GenerationSettings,
    },
}

impl WorkerCommand {
    /// The request this command refers to.
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Dispatch { request_id, .. } => *request_id,
        }
    }
}

/// Event reported by the worker about a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerEvent {
    /// A piece of response text.
    #[serde(rename_all = "camelCase")]
    Chunk {
        request_id: RequestId,
        #[serde(default)]
        text: String,
        #[serde(default)]
        is_final: bool,
    },
    /// The response stream finished without a final chunk.
    #[serde(rename_all = "camelCase")]
    StreamEnded { request_id: RequestId },
    /// The worker failed the request.
    #[serde(rename_all = "camelCase")]
    Error {
        request_id: RequestId,
        #[serde(default)]
        message: String,
    },
    /// Whole response in one message (older workers).
    #[serde(rename_all = "camelCase")]
    Response {
        request_id: RequestId,
        #[serde(default)]
        text: String,
        #[serde(default = "default_true")]
        is_final: bool,
    },
}

const fn default_true() -> bool {
    true
}

const KNOWN_EVENT_TYPES: &[&str] = &["CHUNK", "STREAM_ENDED", "ERROR", "RESPONSE"];

impl WorkerEvent {
    /// The request this event refers to.
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Chunk { request_id, .. }
            | Self::StreamEnded { request_id }
            | Self::Error { request_id, .. }
            | Self::Response { request_id, .. } => *request_id,
        }
    }

    /// Whether this event ends the request.
    pub const fn is_terminal(&self) -> bool {
        match self {
            Self::Chunk { is_final, .. } | Self::Response { is_final, .. } => *is_final,
            Self::StreamEnded { .. } | Self::Error { .. } => true,
        }
    }

    /// Parse a text frame received from the worker.
    pub fn parse(text: &str) -> Result<Self, WorkerEventError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| WorkerEventError::Malformed(e.to_string()))?;

        match value.get("type").and_then(serde_json::Value::as_str) {
            Some(kind) if KNOWN_EVENT_TYPES.contains(&kind) => {}
            Some(kind) => return Err(WorkerEventError::UnknownType(kind.to_string())),
            None => {
                return Err(WorkerEventError::Malformed(
                    "missing `type` field".to_string(),
                ));
            }
        }

        serde_json::from_value(value).map_err(|e| WorkerEventError::Malformed(e.to_string()))
    }
}
