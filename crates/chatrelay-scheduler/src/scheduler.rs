//! The admission-control state machine.
//!
//! Per request: `Received → {Dispatched | Queued | RejectedBusy |
//! RejectedNoWorker}`, `Queued → Dispatched` on drain, and
//! `Dispatched → {Completed | Failed | TimedOut}`.
//!
//! A request lives in exactly one place at a time: the queue, the pending
//! entry, or nowhere (terminal). Once it is terminal nothing references its
//! id, so late events and late timers for it find no state and do nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use chatrelay_core::{
    AdmissionPolicy, ChatRequest, ConfigStore, RelayError, RequestId, RequestIdAllocator,
    WorkerChannel, WorkerCommand, WorkerEvent,
};

use crate::pending::PendingEntry;
use crate::queue::RequestQueue;

/// What `submit` did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Sent to the worker; the slot is now occupied by this request.
    Dispatched,
    /// Waiting for the slot at the given 1-based position.
    Queued { position: usize },
    /// Slot occupied under the drop policy; already resolved as busy.
    RejectedBusy,
    /// No worker; already resolved as unavailable.
    RejectedNoWorker,
}

/// What `on_worker_event` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Chunk text appended, request still in flight.
    Buffered,
    /// Request resolved with its aggregated text.
    Completed,
    /// Request resolved with the worker's error.
    Failed,
    /// Event did not match the in-flight request and was ignored.
    Stale,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub rejected_busy: u64,
    pub rejected_no_worker: u64,
    pub stale_events: u64,
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSnapshot {
    pub active_request_id: Option<RequestId>,
    pub queued: Vec<RequestId>,
    pub queue_depth: usize,
    pub stats: SchedulerStats,
}

#[derive(Debug, Default)]
struct SchedulerState {
    active: Option<PendingEntry>,
    queue: RequestQueue,
    stats: SchedulerStats,
}

/// Owner of the single worker slot.
///
/// Created with [`Scheduler::new`], which returns an `Arc` so timeout
/// timers can call back into the scheduler without keeping it alive.
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    worker: Arc<dyn WorkerChannel>,
    config: Arc<ConfigStore>,
    ids: RequestIdAllocator,
    this: Weak<Self>,
}

impl Scheduler {
    pub fn new(worker: Arc<dyn WorkerChannel>, config: Arc<ConfigStore>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(SchedulerState::default()),
            worker,
            config,
            ids: RequestIdAllocator::new(),
            this: this.clone(),
        })
    }

    /// Allocate the id for a new request.
    pub fn next_request_id(&self) -> RequestId {
        self.ids.next_id()
    }

    /// Admit a request.
    ///
    /// Rejections are resolved on the request's completion handle before
    /// this returns. Dispatched and queued requests resolve later.
    pub fn submit(&self, request: ChatRequest) -> Admission {
        let mut state = self.lock();

        if !self.worker.is_connected() {
            state.stats.rejected_no_worker += 1;
            info!(
                target: "chatrelay.scheduler",
                request_id = %request.id,
                "Rejecting request: no worker connected"
            );
            resolve_rejected(request, RelayError::NoWorkerConnected);
            return Admission::RejectedNoWorker;
        }

        // Earlier arrivals go first if the slot freed while no worker was around.
        self.drain_locked(&mut state);

        if state.active.is_some() {
            return match self.config.admission_policy() {
                AdmissionPolicy::Queue => {
                    let id = request.id;
                    let position = state.queue.push_back(request);
                    debug!(
                        target: "chatrelay.scheduler",
                        request_id = %id,
                        position,
                        "Request queued"
                    );
                    Admission::Queued { position }
                }
                AdmissionPolicy::Drop => {
                    state.stats.rejected_busy += 1;
                    info!(
                        target: "chatrelay.scheduler",
                        request_id = %request.id,
                        "Rejecting request: worker busy"
                    );
                    resolve_rejected(request, RelayError::Busy);
                    Admission::RejectedBusy
                }
            };
        }

        if self.dispatch_locked(&mut state, request) {
            Admission::Dispatched
        } else {
            Admission::RejectedNoWorker
        }
    }

    /// Route an event from the worker to the in-flight request.
    pub fn on_worker_event(&self, event: WorkerEvent) -> EventDisposition {
        let mut state = self.lock();
        let id = event.request_id();

        let in_flight = state.active.as_ref().map(PendingEntry::request_id);
        if in_flight != Some(id) {
            state.stats.stale_events += 1;
            debug!(
                target: "chatrelay.scheduler",
                request_id = %id,
                active_request_id = ?in_flight,
                "Ignoring event for a request that is not in flight"
            );
            return EventDisposition::Stale;
        }
        let Some(entry) = state.active.as_mut() else {
            return EventDisposition::Stale;
        };

        let terminal = event.is_terminal();
        let failure = match event {
            WorkerEvent::Chunk { text, .. } | WorkerEvent::Response { text, .. } => {
                entry.append(&text);
                None
            }
            WorkerEvent::StreamEnded { .. } => None,
            WorkerEvent::Error { message, .. } => Some(message),
        };
        if !terminal {
            return EventDisposition::Buffered;
        }

        let Some(entry) = state.active.take() else {
            return EventDisposition::Stale;
        };
        let elapsed_ms = duration_ms(entry.elapsed());

        let (disposition, delivered) = match failure {
            None => {
                state.stats.completed += 1;
                info!(
                    target: "chatrelay.scheduler",
                    request_id = %id,
                    model = entry.model(),
                    chunks = entry.chunk_count(),
                    elapsed_ms,
                    total_ms = duration_ms(entry.since_received()),
                    "Request completed"
                );
                (EventDisposition::Completed, entry.complete())
            }
            Some(message) => {
                state.stats.failed += 1;
                warn!(
                    target: "chatrelay.scheduler",
                    request_id = %id,
                    error = %message,
                    elapsed_ms,
                    "Worker reported an error"
                );
                (
                    EventDisposition::Failed,
                    entry.fail(RelayError::WorkerReportedError(message)),
                )
            }
        };
        if !delivered {
            debug!(target: "chatrelay.scheduler", request_id = %id, "Caller no longer waiting");
        }

        self.drain_locked(&mut state);
        disposition
    }

    /// Fail the in-flight request `id` with a timeout.
    ///
    /// Returns `false` (and changes nothing) if `id` is no longer in flight.
    pub fn on_timeout(&self, id: RequestId) -> bool {
        let mut state = self.lock();

        let Some(entry) = state.active.take_if(|entry| entry.request_id() == id) else {
            debug!(target: "chatrelay.scheduler", request_id = %id, "Timer fired after resolution");
            return false;
        };

        state.stats.timed_out += 1;
        let after_ms = duration_ms(entry.timeout_after());
        warn!(
            target: "chatrelay.scheduler",
            request_id = %id,
            after_ms,
            "Request timed out"
        );
        if !entry.fail(RelayError::Timeout { after_ms }) {
            debug!(target: "chatrelay.scheduler", request_id = %id, "Caller no longer waiting");
        }

        self.drain_locked(&mut state);
        true
    }

    /// A worker became active: dispatch whatever has been waiting.
    pub fn on_worker_connected(&self) {
        let mut state = self.lock();
        info!(
            target: "chatrelay.scheduler",
            queued = state.queue.len(),
            "Worker available"
        );
        self.drain_locked(&mut state);
    }

    /// The active worker went away.
    ///
    /// The in-flight request is left to its timer.
    pub fn on_worker_disconnected(&self) {
        let state = self.lock();
        warn!(
            target: "chatrelay.scheduler",
            active_request_id = ?state.active.as_ref().map(PendingEntry::request_id),
            queued = state.queue.len(),
            "Worker unavailable"
        );
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.lock();
        SchedulerSnapshot {
            active_request_id: state.active.as_ref().map(PendingEntry::request_id),
            queued: state.queue.ids(),
            queue_depth: state.queue.len(),
            stats: state.stats,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch queued requests while the slot is free and a worker is there.
    ///
    /// Stops at the first failed send. The rest of the queue waits for the
    /// next worker to become active.
    fn drain_locked(&self, state: &mut SchedulerState) {
        while state.active.is_none() && self.worker.is_connected() {
            let Some(entry) = state.queue.pop_front() else {
                break;
            };
            debug!(
                target: "chatrelay.scheduler",
                request_id = %entry.request.id,
                waited_ms = duration_ms(entry.enqueued_at.elapsed()),
                "Draining queued request"
            );
            if !self.dispatch_locked(state, entry.request) {
                break;
            }
        }
    }

    /// Occupy the slot with `request` and send it to the worker.
    ///
    /// Returns `false` if the send failed; the request is then resolved as
    /// `NoWorkerConnected` and the slot stays free.
    fn dispatch_locked(&self, state: &mut SchedulerState, request: ChatRequest) -> bool {
        let ChatRequest {
            id,
            payload,
            settings,
            received_at,
            completion,
        } = request;
        let model = settings.model.clone();

        let command = WorkerCommand::Dispatch {
            request_id: id,
            payload,
            settings,
        };
        if let Err(e) = self.worker.send(command) {
            state.stats.rejected_no_worker += 1;
            warn!(
                target: "chatrelay.scheduler",
                request_id = %id,
                error = %e,
                "Dispatch failed"
            );
            completion.resolve(Err(RelayError::NoWorkerConnected));
            return false;
        }

        let timeout = self.config.request_timeout();
        let timer = self.arm_timeout(id, timeout);
        state.active = Some(PendingEntry::new(
            id,
            model,
            completion,
            timer,
            timeout,
            received_at,
        ));
        state.stats.dispatched += 1;

        info!(
            target: "chatrelay.scheduler",
            request_id = %id,
            timeout_ms = duration_ms(timeout),
            queued = state.queue.len(),
            "Request dispatched"
        );
        true
    }

    /// The deadline is fixed here, at dispatch, not when the task first runs.
    fn arm_timeout(&self, id: RequestId, after: Duration) -> AbortHandle {
        let deadline = Instant::now() + after;
        let scheduler = self.this.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(scheduler) = scheduler.upgrade() {
                scheduler.on_timeout(id);
            }
        })
        .abort_handle()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

fn resolve_rejected(request: ChatRequest, error: RelayError) {
    if !request.completion.resolve(Err(error)) {
        debug!(target: "chatrelay.scheduler", request_id = %request.id, "Caller no longer waiting");
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
