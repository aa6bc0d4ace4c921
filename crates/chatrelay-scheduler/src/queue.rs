//! FIFO buffer of requests waiting for the worker slot.
//!
//! Pure synchronous state: no locking, no I/O, no tracing. The
//! [`Scheduler`](crate::Scheduler) is responsible for synchronization.

use std::collections::VecDeque;

use chatrelay_core::{ChatRequest, RequestId};
use tokio::time::Instant;

/// A request parked in the queue.
#[derive(Debug)]
pub struct QueueEntry {
    pub request: ChatRequest,
    pub enqueued_at: Instant,
}

/// Strict FIFO queue. Entries leave only through [`RequestQueue::pop_front`].
#[derive(Debug, Default)]
pub struct RequestQueue {
    entries: VecDeque<QueueEntry>,
}

impl RequestQueue {
    pub const fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append a request to the tail.
    ///
    /// Returns its 1-based position among waiting requests.
    pub fn push_back(&mut self, request: ChatRequest) -> usize {
        self.entries.push_back(QueueEntry {
            request,
            enqueued_at: Instant::now(),
        });
        self.entries.len()
    }

    /// Remove and return the head.
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of waiting requests, head first.
    pub fn ids(&self) -> Vec<RequestId> {
        self.entries.iter().map(|entry| entry.request.id).collect()
    }
}
