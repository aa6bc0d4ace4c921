//! OpenAI-compatible chat completion request and response envelopes.
//!
//! Building a response envelope is deterministic and side-effect free: the
//! same completion (or failure) always yields the same body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ChatRequest, Completion, CompletionReceiver, GenerationSettings, RequestId};
use crate::errors::RelayError;

/// Request to `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionRequest {
    /// Model name to use.
    pub model: String,
    /// Array of chat messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0-2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(default, alias = "max_tokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A single chat message.
///
/// `content` is kept opaque: plain text or an array of content parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant", or "tool".
    pub role: String,
    /// Message content.
    #[serde(default)]
    pub content: serde_json::Value,
}

impl ChatMessage {
    fn into_value(self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(2);
        map.insert("role".to_string(), serde_json::Value::String(self.role));
        map.insert("content".to_string(), self.content);
        serde_json::Value::Object(map)
    }
}

/// Why an inbound chat request was refused before admission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    #[error("`model` must not be empty")]
    EmptyModel,

    #[error("`messages` must contain at least one message")]
    NoMessages,

    #[error("message {0} has an empty `role`")]
    EmptyRole(usize),

    #[error("message {0} has no `content`")]
    MissingContent(usize),

    #[error("`temperature` must be between 0 and 2")]
    TemperatureOutOfRange,

    #[error("`maxTokens` must be greater than 0")]
    ZeroMaxTokens,
}

impl ChatCompletionRequest {
    /// Check the request shape.
    pub fn validate(&self) -> Result<(), RequestValidationError> {
        if self.model.trim().is_empty() {
            return Err(RequestValidationError::EmptyModel);
        }
        if self.messages.is_empty() {
            return Err(RequestValidationError::NoMessages);
        }
        for (index, message) in self.messages.iter().enumerate() {
            if message.role.trim().is_empty() {
                return Err(RequestValidationError::EmptyRole(index));
            }
            if message.content.is_null() {
                return Err(RequestValidationError::MissingContent(index));
            }
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(RequestValidationError::TemperatureOutOfRange);
            }
        }
        if self.max_tokens == Some(0) {
            return Err(RequestValidationError::ZeroMaxTokens);
        }
        Ok(())
    }

    /// Turn the request into a scheduler record with id `id`.
    pub fn into_chat_request(self, id: RequestId) -> (ChatRequest, CompletionReceiver) {
        let settings = GenerationSettings {
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let payload = serde_json::Value::Array(
            self.messages
                .into_iter()
                .map(ChatMessage::into_value)
                .collect(),
        );
        ChatRequest::new(id, payload, settings)
    }
}

/// Response from `/v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

/// A single chat completion choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

/// The assistant message of a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// Token usage statistics. The worker does not report counts, so all are -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

impl Usage {
    /// Usage marker for "not reported".
    pub const UNKNOWN: Self = Self {
        prompt_tokens: -1,
        completion_tokens: -1,
        total_tokens: -1,
    };
}

impl ChatCompletionResponse {
    /// Build the success envelope for a completed request.
    pub fn from_completion(
        id: RequestId,
        model: &str,
        created: i64,
        completion: &Completion,
    ) -> Self {
        Self {
            id: format!("chatcmpl-{id}"),
            object: "chat.completion".to_string(),
            created,
            model: model.to_string(),
            choices: vec![ChatChoice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content: completion.text.clone(),
                },
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::UNKNOWN,
        }
    }
}

/// OpenAI-style error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Create an error response.
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type: error_type.into(),
                code: None,
            },
        }
    }

    /// Attach a machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error.code = Some(code.into());
        self
    }

    /// Invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(message, "invalid_request_error")
    }
}

impl From<&RelayError> for ErrorResponse {
    fn from(err: &RelayError) -> Self {
        Self::new(err.to_string(), err.kind()).with_code(err.kind())
    }
}
