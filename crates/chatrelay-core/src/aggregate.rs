//! Response aggregation for the in-flight request.
//!
//! Only one request is ever in flight, so chunks arrive in the only order
//! that matters and are appended as-is.

use crate::domain::Completion;

/// Accumulates chunk text for one dispatched request.
#[derive(Debug, Clone, Default)]
pub struct ResponseAggregator {
    text: String,
    chunks: usize,
}

impl ResponseAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            chunks: 0,
        }
    }

    /// Append one chunk in arrival order.
    pub fn push(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.chunks += 1;
    }

    /// Number of chunks received so far.
    pub const fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Consume the aggregator and produce the final completion.
    pub fn finish(self) -> Completion {
        Completion::new(self.text)
    }
}
