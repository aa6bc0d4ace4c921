//! Axum-specific error types and mappings.
//!
//! Every failure leaves the server as an OpenAI-style
//! `{"error": {"message", "type", "code"}}` body.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chatrelay_core::{CoreError, ErrorResponse, RelayError, RequestValidationError};
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (invalid input).
    #[error("{0}")]
    BadRequest(String),

    /// The relay could not produce a completion.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Relay(err) => match err {
                RelayError::Busy => StatusCode::TOO_MANY_REQUESTS,
                RelayError::NoWorkerConnected => StatusCode::SERVICE_UNAVAILABLE,
                RelayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                RelayError::WorkerReportedError(_) => StatusCode::BAD_GATEWAY,
                RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::BadRequest(msg) => ErrorResponse::invalid_request(msg.clone()),
            Self::Relay(err) => ErrorResponse::from(err),
            Self::Internal(msg) => ErrorResponse::new(msg.clone(), "internal_error"),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(self.body())).into_response();

        // Busy and no-worker are transient
        if matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }

        response
    }
}

impl From<RequestValidationError> for HttpError {
    fn from(err: RequestValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(e) => Self::BadRequest(e.to_string()),
            CoreError::Repository(e) => Self::Internal(e.to_string()),
        }
    }
}
