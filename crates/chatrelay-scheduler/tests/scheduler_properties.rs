//! Behavioral tests for the scheduler against a scripted worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatrelay_core::{
    AdmissionPolicy, ChatRequest, Completion, CompletionReceiver, ConfigStore,
    GenerationSettings, InMemoryConfigRepository, RelayError, RequestId, ServerConfig,
    ServerConfigUpdate, WorkerChannel, WorkerCommand, WorkerEvent, WorkerSendError,
};
use chatrelay_scheduler::{Admission, EventDisposition, Scheduler};
use tokio::sync::oneshot::error::TryRecvError;
use tokio_test::assert_ok;

/// Worker fake that records dispatched ids.
#[derive(Default)]
struct ScriptedWorker {
    connected: AtomicBool,
    reject_sends: AtomicBool,
    sent: Mutex<Vec<WorkerCommand>>,
}

impl ScriptedWorker {
    fn online() -> Arc<Self> {
        let worker = Self::default();
        worker.connected.store(true, Ordering::SeqCst);
        Arc::new(worker)
    }

    fn offline() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn dispatched(&self) -> Vec<RequestId> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(WorkerCommand::request_id)
            .collect()
    }
}

impl WorkerChannel for ScriptedWorker {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send(&self, command: WorkerCommand) -> Result<(), WorkerSendError> {
        if !self.is_connected() {
            return Err(WorkerSendError::NotConnected);
        }
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(WorkerSendError::ChannelClosed);
        }
        self.sent.lock().unwrap().push(command);
        Ok(())
    }
}

fn setup(
    worker: &Arc<ScriptedWorker>,
    timeout_ms: u64,
    policy: AdmissionPolicy,
) -> (Arc<Scheduler>, Arc<ConfigStore>) {
    let config = ServerConfig {
        request_timeout_ms: timeout_ms,
        admission_policy: policy,
        ..ServerConfig::default()
    };
    let repo = Arc::new(InMemoryConfigRepository::new(config.clone()));
    let store = Arc::new(ConfigStore::new(repo, config));
    let scheduler = Scheduler::new(worker.clone(), store.clone());
    (scheduler, store)
}

fn request(scheduler: &Scheduler) -> (RequestId, ChatRequest, CompletionReceiver) {
    let id = scheduler.next_request_id();
    let (request, rx) = ChatRequest::new(
        id,
        serde_json::json!([{"role": "user", "content": "hi"}]),
        GenerationSettings {
            model: "test-model".to_string(),
            ..GenerationSettings::default()
        },
    );
    (id, request, rx)
}

fn submit(scheduler: &Scheduler) -> (RequestId, Admission, CompletionReceiver) {
    let (id, request, rx) = request(scheduler);
    let admission = scheduler.submit(request);
    (id, admission, rx)
}

fn end(id: RequestId) -> WorkerEvent {
    WorkerEvent::StreamEnded { request_id: id }
}

#[tokio::test]
async fn no_worker_fails_fast_without_occupying_anything() {
    let worker = ScriptedWorker::offline();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);

    let (_, admission, mut rx) = submit(&scheduler);

    assert_eq!(admission, Admission::RejectedNoWorker);
    assert_eq!(rx.try_recv().unwrap(), Err(RelayError::NoWorkerConnected));
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.active_request_id, None);
    assert_eq!(snapshot.queue_depth, 0);
    assert_eq!(snapshot.stats.rejected_no_worker, 1);
    assert!(worker.dispatched().is_empty());
}

#[tokio::test]
async fn chunks_are_assembled_into_one_completion() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);
    let (id, admission, rx) = submit(&scheduler);
    assert_eq!(admission, Admission::Dispatched);

    let first = scheduler.on_worker_event(WorkerEvent::Chunk {
        request_id: id,
        text: "Hel".to_string(),
        is_final: false,
    });
    let last = scheduler.on_worker_event(WorkerEvent::Chunk {
        request_id: id,
        text: "lo".to_string(),
        is_final: true,
    });

    assert_eq!(first, EventDisposition::Buffered);
    assert_eq!(last, EventDisposition::Completed);
    assert_eq!(rx.await.unwrap(), Ok(Completion::new("Hello")));
    assert_eq!(scheduler.snapshot().active_request_id, None);
}

#[tokio::test]
async fn legacy_response_completes_in_one_event() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);
    let (id, _, rx) = submit(&scheduler);

    let disposition = scheduler.on_worker_event(WorkerEvent::Response {
        request_id: id,
        text: "whole answer".to_string(),
        is_final: true,
    });

    assert_eq!(disposition, EventDisposition::Completed);
    assert_eq!(rx.await.unwrap(), Ok(Completion::new("whole answer")));
}

#[tokio::test]
async fn queued_requests_dispatch_in_submission_order() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);

    let (first, _, _rx0) = submit(&scheduler);
    let (a, admission_a, _rx_a) = submit(&scheduler);
    let (b, admission_b, _rx_b) = submit(&scheduler);
    let (c, admission_c, _rx_c) = submit(&scheduler);

    assert_eq!(admission_a, Admission::Queued { position: 1 });
    assert_eq!(admission_b, Admission::Queued { position: 2 });
    assert_eq!(admission_c, Admission::Queued { position: 3 });
    assert_eq!(scheduler.snapshot().queued, vec![a, b, c]);

    for id in [first, a, b, c] {
        assert_eq!(scheduler.snapshot().active_request_id, Some(id));
        assert_eq!(scheduler.on_worker_event(end(id)), EventDisposition::Completed);
    }

    assert_eq!(worker.dispatched(), vec![first, a, b, c]);
    assert_eq!(scheduler.snapshot().active_request_id, None);
}

#[tokio::test]
async fn drop_policy_rejects_without_disturbing_in_flight_request() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Drop);

    let (first, _, rx_first) = submit(&scheduler);
    let (_, admission, mut rx_second) = submit(&scheduler);

    assert_eq!(admission, Admission::RejectedBusy);
    assert_eq!(rx_second.try_recv().unwrap(), Err(RelayError::Busy));
    assert_eq!(scheduler.snapshot().queue_depth, 0);
    assert_eq!(worker.dispatched(), vec![first]);

    scheduler.on_worker_event(WorkerEvent::Chunk {
        request_id: first,
        text: "ok".to_string(),
        is_final: true,
    });
    assert_eq!(assert_ok!(rx_first.await), Ok(Completion::new("ok")));
}

#[tokio::test(start_paused = true)]
async fn timeout_frees_the_slot_for_the_next_request() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 100, AdmissionPolicy::Queue);
    let started = tokio::time::Instant::now();

    let (a, _, mut rx_a) = submit(&scheduler);
    let (b, admission_b, _rx_b) = submit(&scheduler);
    assert_eq!(admission_b, Admission::Queued { position: 1 });

    tokio::time::sleep(Duration::from_millis(99)).await;
    assert_eq!(rx_a.try_recv(), Err(TryRecvError::Empty));

    let outcome = rx_a.await.unwrap();
    assert_eq!(outcome, Err(RelayError::Timeout { after_ms: 100 }));
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(100));
    assert!(waited < Duration::from_millis(110));

    assert_eq!(worker.dispatched(), vec![a, b]);
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.active_request_id, Some(b));
    assert_eq!(snapshot.stats.timed_out, 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_measured_from_dispatch() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 100, AdmissionPolicy::Queue);
    let dispatched_at = tokio::time::Instant::now();
    let (_, admission, rx) = submit(&scheduler);
    assert_eq!(admission, Admission::Dispatched);

    // The clock moves before the timer task is first polled.
    tokio::time::advance(Duration::from_millis(60)).await;

    assert_eq!(rx.await.unwrap(), Err(RelayError::Timeout { after_ms: 100 }));
    assert!(dispatched_at.elapsed() < Duration::from_millis(110));
}

#[tokio::test(start_paused = true)]
async fn duplicate_terminal_events_are_no_ops() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 100, AdmissionPolicy::Queue);
    let (id, _, rx) = submit(&scheduler);

    let error = || WorkerEvent::Error {
        request_id: id,
        message: "model crashed".to_string(),
    };
    assert_eq!(scheduler.on_worker_event(error()), EventDisposition::Failed);
    assert_eq!(scheduler.on_worker_event(error()), EventDisposition::Stale);
    assert_eq!(scheduler.on_worker_event(end(id)), EventDisposition::Stale);
    assert!(!scheduler.on_timeout(id));

    assert_eq!(
        rx.await.unwrap(),
        Err(RelayError::WorkerReportedError("model crashed".to_string()))
    );

    // The cancelled timer never fires.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let stats = scheduler.snapshot().stats;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.timed_out, 0);
    assert_eq!(stats.stale_events, 2);
}

#[tokio::test(start_paused = true)]
async fn late_events_for_a_timed_out_request_are_ignored() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 50, AdmissionPolicy::Queue);
    let (id, _, rx) = submit(&scheduler);

    assert_eq!(rx.await.unwrap(), Err(RelayError::Timeout { after_ms: 50 }));
    assert_eq!(scheduler.on_worker_event(end(id)), EventDisposition::Stale);
    assert_eq!(scheduler.snapshot().stats.completed, 0);
}

#[tokio::test]
async fn policy_change_keeps_already_queued_requests() {
    let worker = ScriptedWorker::online();
    let (scheduler, config) = setup(&worker, 1_000, AdmissionPolicy::Queue);

    let (first, _, _rx0) = submit(&scheduler);
    let (a, _, rx_a) = submit(&scheduler);
    let (b, _, rx_b) = submit(&scheduler);

    config
        .update(ServerConfigUpdate {
            admission_policy: Some(AdmissionPolicy::Drop),
            ..ServerConfigUpdate::default()
        })
        .await
        .unwrap();

    let (_, late, _rx_late) = submit(&scheduler);
    assert_eq!(late, Admission::RejectedBusy);
    assert_eq!(scheduler.snapshot().queued, vec![a, b]);

    scheduler.on_worker_event(end(first));
    scheduler.on_worker_event(end(a));
    scheduler.on_worker_event(end(b));

    assert_eq!(worker.dispatched(), vec![first, a, b]);
    assert_ok!(assert_ok!(rx_a.await));
    assert_ok!(assert_ok!(rx_b.await));
}

#[tokio::test]
async fn updated_timeout_applies_to_the_next_dispatch() {
    let worker = ScriptedWorker::online();
    let (scheduler, config) = setup(&worker, 1_000, AdmissionPolicy::Queue);

    config
        .update(ServerConfigUpdate {
            request_timeout_ms: Some(5),
            ..ServerConfigUpdate::default()
        })
        .await
        .unwrap();

    let (_, _, rx) = submit(&scheduler);
    assert_eq!(rx.await.unwrap(), Err(RelayError::Timeout { after_ms: 5 }));
}

#[tokio::test(start_paused = true)]
async fn disconnect_leaves_in_flight_request_to_its_timer() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 100, AdmissionPolicy::Queue);
    let (id, _, mut rx) = submit(&scheduler);

    worker.set_connected(false);
    scheduler.on_worker_disconnected();

    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(scheduler.snapshot().active_request_id, Some(id));

    let (_, admission, _rx) = submit(&scheduler);
    assert_eq!(admission, Admission::RejectedNoWorker);

    assert_eq!(rx.await.unwrap(), Err(RelayError::Timeout { after_ms: 100 }));
}

#[tokio::test]
async fn reconnect_drains_requests_left_in_the_queue() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);
    let (first, _, _rx0) = submit(&scheduler);
    let (waiting, _, _rx1) = submit(&scheduler);

    worker.set_connected(false);
    scheduler.on_worker_event(end(first));

    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.active_request_id, None);
    assert_eq!(snapshot.queued, vec![waiting]);

    worker.set_connected(true);
    scheduler.on_worker_connected();

    assert_eq!(scheduler.snapshot().active_request_id, Some(waiting));
    assert_eq!(worker.dispatched(), vec![first, waiting]);
}

#[tokio::test]
async fn new_submission_waits_behind_requests_left_in_the_queue() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);
    let (first, _, _rx0) = submit(&scheduler);
    let (waiting, _, _rx1) = submit(&scheduler);

    worker.set_connected(false);
    scheduler.on_worker_event(end(first));
    worker.set_connected(true);

    let (newcomer, admission, _rx2) = submit(&scheduler);

    assert_eq!(admission, Admission::Queued { position: 1 });
    assert_eq!(scheduler.snapshot().active_request_id, Some(waiting));
    assert_eq!(scheduler.snapshot().queued, vec![newcomer]);
}

#[tokio::test]
async fn failed_send_is_reported_as_no_worker() {
    let worker = ScriptedWorker::online();
    worker.reject_sends.store(true, Ordering::SeqCst);
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);

    let (_, admission, mut rx) = submit(&scheduler);

    assert_eq!(admission, Admission::RejectedNoWorker);
    assert_eq!(rx.try_recv().unwrap(), Err(RelayError::NoWorkerConnected));
    assert_eq!(scheduler.snapshot().active_request_id, None);
}

#[tokio::test]
async fn failed_send_during_drain_keeps_the_rest_queued() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 1_000, AdmissionPolicy::Queue);
    let (first, _, _rx0) = submit(&scheduler);
    let (_, _, mut rx_b) = submit(&scheduler);
    let (c, _, mut rx_c) = submit(&scheduler);

    // Channel closed but the worker not yet deregistered.
    worker.reject_sends.store(true, Ordering::SeqCst);
    scheduler.on_worker_event(end(first));

    assert_eq!(rx_b.try_recv().unwrap(), Err(RelayError::NoWorkerConnected));
    assert_eq!(rx_c.try_recv(), Err(TryRecvError::Empty));
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.active_request_id, None);
    assert_eq!(snapshot.queued, vec![c]);

    worker.reject_sends.store(false, Ordering::SeqCst);
    scheduler.on_worker_connected();

    assert_eq!(scheduler.snapshot().active_request_id, Some(c));
    assert_eq!(worker.dispatched(), vec![first, c]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_never_exceed_one_in_flight() {
    let worker = ScriptedWorker::online();
    let (scheduler, _) = setup(&worker, 10_000, AdmissionPolicy::Queue);

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let scheduler = scheduler.clone();
        tasks.push(tokio::spawn(async move {
            let (_, admission, rx) = submit(&scheduler);
            (admission, rx)
        }));
    }
    let mut receivers = Vec::new();
    let mut dispatched_now = 0;
    for task in tasks {
        let (admission, rx) = task.await.unwrap();
        if admission == Admission::Dispatched {
            dispatched_now += 1;
        }
        receivers.push(rx);
    }

    assert_eq!(dispatched_now, 1);
    assert_eq!(worker.dispatched().len(), 1);
    assert_eq!(scheduler.snapshot().queue_depth, 31);

    let mut completed = 0;
    while let Some(active) = scheduler.snapshot().active_request_id {
        assert_eq!(worker.dispatched().len(), completed + 1);
        scheduler.on_worker_event(end(active));
        completed += 1;
    }
    assert_eq!(completed, 32);

    for rx in receivers {
        assert_ok!(assert_ok!(rx.await));
    }
}
