//! Failure taxonomy for relayed requests.

use thiserror::Error;

/// Why a request did not produce a completion.
///
/// Admission failures (`NoWorkerConnected`, `Busy`) are reported before the
/// request ever occupies the worker slot. `Timeout` and `WorkerReportedError`
/// happen after dispatch and travel through the same completion path as a
/// successful response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// No worker was connected when the request arrived.
    #[error("No worker is connected")]
    NoWorkerConnected,

    /// The worker slot was occupied and the admission policy is `drop`.
    #[error("Worker is busy with another request")]
    Busy,

    /// The worker sent no terminal event in time.
    #[error("Request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    /// The worker reported a failure for this request.
    #[error("Worker error: {0}")]
    WorkerReportedError(String),

    /// The request was dropped without being resolved.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Stable error type discriminant for client-side handling.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoWorkerConnected => "no_worker_connected",
            Self::Busy => "server_busy",
            Self::Timeout { .. } => "request_timeout",
            Self::WorkerReportedError(_) => "worker_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// A worker message that could not be turned into a [`WorkerEvent`].
///
/// These are logged and dropped; they never fail the in-flight request.
///
/// [`WorkerEvent`]: crate::domain::WorkerEvent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerEventError {
    /// Not valid JSON or missing required fields.
    #[error("Malformed worker event: {0}")]
    Malformed(String),

    /// Valid JSON with a `type` the relay does not understand.
    #[error("Unknown worker event type: {0}")]
    UnknownType(String),
}
