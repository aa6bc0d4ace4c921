//! Chat request records and the completion handle used to answer callers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::errors::RelayError;

/// Identifier for a relayed request.
///
/// Ids are allocated by [`RequestIdAllocator`], increase monotonically and are
/// never reused for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out request ids, starting at 1.
#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicU64,
}

impl RequestIdAllocator {
    /// Create an allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> RequestId {
        RequestId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generation settings forwarded to the worker untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Model name requested by the caller.
    pub model: String,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Final text produced by the worker for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Aggregated assistant text.
    pub text: String,
}

impl Completion {
    /// Create a completion from aggregated text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Terminal result delivered to a caller.
pub type Outcome = Result<Completion, RelayError>;

/// Receiving half of a [`CompletionHandle`], held by the gateway.
pub type CompletionReceiver = oneshot::Receiver<Outcome>;

/// The means to answer the caller of one request.
///
/// Resolving consumes the handle, so a handle can be resolved at most once.
#[derive(Debug)]
pub struct CompletionHandle {
    tx: oneshot::Sender<Outcome>,
}

impl CompletionHandle {
    /// Create a handle together with the receiver the caller awaits.
    #[must_use]
    pub fn new() -> (Self, CompletionReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Deliver the terminal outcome.
    ///
    /// Returns `false` when the caller is no longer waiting.
    pub fn resolve(self, outcome: Outcome) -> bool {
        self.tx.send(outcome).is_ok()
    }
}

/// A chat request on its way to the worker.
///
/// Created by the gateway on receipt and consumed when the request reaches a
/// terminal state.
#[derive(Debug)]
pub struct ChatRequest {
    /// Unique id for this request.
    pub id: RequestId,
    /// Message content, opaque to the scheduler.
    pub payload: serde_json::Value,
    /// Generation settings, opaque to the scheduler.
    pub settings: GenerationSettings,
    /// When the gateway accepted the request.
    pub received_at: Instant,
    /// How to answer the caller.
    pub completion: CompletionHandle,
}

impl ChatRequest {
    /// Build a request and return the receiver its caller should await.
    pub fn new(
        id: RequestId,
        payload: serde_json::Value,
        settings: GenerationSettings,
    ) -> (Self, CompletionReceiver) {
        let (completion, receiver) = CompletionHandle::new();
        let request = Self {
            id,
            payload,
            settings,
            received_at: Instant::now(),
            completion,
        };
        (request, receiver)
    }
}
