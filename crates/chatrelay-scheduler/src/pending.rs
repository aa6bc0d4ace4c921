//! The in-flight request record.

use std::time::Duration;

use chatrelay_core::{CompletionHandle, RelayError, RequestId, ResponseAggregator};
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Everything the scheduler knows about the dispatched request.
///
/// At most one exists at a time. Resolving consumes the entry and cancels
/// its timer, so an entry can answer its caller only once.
#[derive(Debug)]
pub struct PendingEntry {
    request_id: RequestId,
    model: String,
    completion: CompletionHandle,
    timer: AbortHandle,
    timeout_after: Duration,
    aggregator: ResponseAggregator,
    received_at: std::time::Instant,
    created_at: Instant,
}

impl PendingEntry {
    pub fn new(
        request_id: RequestId,
        model: String,
        completion: CompletionHandle,
        timer: AbortHandle,
        timeout_after: Duration,
        received_at: std::time::Instant,
    ) -> Self {
        Self {
            request_id,
            model,
            completion,
            timer,
            timeout_after,
            aggregator: ResponseAggregator::new(),
            received_at,
            created_at: Instant::now(),
        }
    }

    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Timeout armed at dispatch.
    pub const fn timeout_after(&self) -> Duration {
        self.timeout_after
    }

    /// Time since dispatch.
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since the gateway accepted the request, queue wait included.
    pub fn since_received(&self) -> Duration {
        self.received_at.elapsed()
    }

    /// Append chunk text in arrival order.
    pub fn append(&mut self, text: &str) {
        self.aggregator.push(text);
    }

    pub const fn chunk_count(&self) -> usize {
        self.aggregator.chunk_count()
    }

    /// Resolve with the aggregated text.
    ///
    /// Returns `false` if the caller stopped waiting.
    pub fn complete(self) -> bool {
        self.timer.abort();
        let completion = self.aggregator.finish();
        self.completion.resolve(Ok(completion))
    }

    /// Resolve with a failure.
    pub fn fail(self, error: RelayError) -> bool {
        self.timer.abort();
        self.completion.resolve(Err(error))
    }
}
