//! WebSocket transport for the worker.
//!
//! `GET /ws` upgrades to a text WebSocket carrying the JSON worker protocol:
//! `DISPATCH` frames go out, `CHUNK` / `STREAM_ENDED` / `ERROR` /
//! `RESPONSE` frames come in.
//!
//! ## Lifecycle
//!
//! 1. Register with the [`WorkerHub`](crate::worker_hub::WorkerHub). If this
//!    connection is now active, let the scheduler drain its queue.
//! 2. Spawn two tasks:
//!    * **Ingest**: parse inbound frames and hand events from the active
//!      connection to the scheduler. Standby connections are not heard.
//!    * **Egress**: forward dispatch commands to the socket.
//! 3. `tokio::select!` waits for either task to finish or for shutdown.
//! 4. Deregister. An in-flight request is left to its timer; a promoted
//!    standby gets the queue.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use chatrelay_core::WorkerEvent;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::state::AppState;
use crate::worker_hub::Registration;

/// `GET /ws`.
pub async fn worker_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_worker_socket(socket, state))
}

async fn handle_worker_socket(socket: WebSocket, state: AppState) {
    let Registration {
        id,
        mut outbound,
        active,
    } = state.workers.register();

    info!(target: "chatrelay.worker", connection_id = id, active, "Worker connected");
    if active {
        state.scheduler.on_worker_connected();
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut egress = tokio::spawn(async move {
        while let Some(command) = outbound.recv().await {
            let frame = match serde_json::to_string(&command) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(target: "chatrelay.worker", connection_id = id, error = %e, "Failed to encode command");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let scheduler = Arc::clone(&state.scheduler);
    let workers = Arc::clone(&state.workers);
    let mut ingest = tokio::spawn(async move {
        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Text(text)) => match WorkerEvent::parse(text.as_str()) {
                    Ok(event) if !workers.is_active(id) => {
                        warn!(
                            target: "chatrelay.worker",
                            connection_id = id,
                            request_id = %event.request_id(),
                            "Ignoring event from standby worker"
                        );
                    }
                    Ok(event) => {
                        let request_id = event.request_id();
                        let disposition = scheduler.on_worker_event(event);
                        debug!(
                            target: "chatrelay.worker",
                            connection_id = id,
                            request_id = %request_id,
                            ?disposition,
                            "Worker event"
                        );
                    }
                    Err(e) => {
                        warn!(target: "chatrelay.worker", connection_id = id, error = %e, "Dropping worker frame");
                    }
                },
                Ok(Message::Close(_)) | Err(_) => break,
                // Ignore binary and ping/pong frames.
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut ingest => { egress.abort(); }
        _ = &mut egress => { ingest.abort(); }
        () = state.shutdown.cancelled() => {
            ingest.abort();
            egress.abort();
        }
    }

    let outcome = state.workers.deregister(id);
    info!(
        target: "chatrelay.worker",
        connection_id = id,
        was_active = outcome.was_active,
        promoted = ?outcome.promoted,
        "Worker disconnected"
    );
    if outcome.was_active {
        state.scheduler.on_worker_disconnected();
    }
    if outcome.promoted.is_some() {
        state.scheduler.on_worker_connected();
    }
}
