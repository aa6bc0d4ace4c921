//! Worker channel trait definition.
//!
//! The relay talks to exactly one active worker. This port hides how that
//! worker is reached (WebSocket, in-process fake in tests) from the scheduler.

use thiserror::Error;

use crate::domain::WorkerCommand;

/// Why a command could not be handed to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerSendError {
    /// No worker is currently active.
    #[error("No worker connected")]
    NotConnected,

    /// The active worker's outbound channel has already closed.
    #[error("Worker channel closed")]
    ChannelClosed,
}

/// Connection to the single active worker.
///
/// # Design Rules
///
/// - `send` returns immediately and never panics; failures come back as
///   [`WorkerSendError`] and leave shared state untouched
/// - Disconnects are observed through `is_connected`, they do not fail
///   requests on their own
pub trait WorkerChannel: Send + Sync {
    /// Whether a worker is currently active.
    fn is_connected(&self) -> bool;

    /// Deliver a command to the active worker.
    fn send(&self, command: WorkerCommand) -> Result<(), WorkerSendError>;
}
