//! Admission control and request relay for chatrelay.
//!
//! The [`Scheduler`] owns the single worker slot. It decides whether a new
//! request is dispatched, queued or rejected, correlates worker events with
//! the in-flight request, and drains the queue whenever the slot frees.
//!
//! # Concurrency Model
//!
//! - One `std::sync::Mutex` guards the slot, the queue and the pending entry
//! - The lock is never held across an `.await`
//! - Callers wait on a oneshot receiver, not on the lock

#![deny(unsafe_code)]

mod pending;
mod queue;
mod scheduler;

pub use pending::PendingEntry;
pub use queue::{QueueEntry, RequestQueue};
pub use scheduler::{Admission, EventDisposition, Scheduler, SchedulerSnapshot, SchedulerStats};
