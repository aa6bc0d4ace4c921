//! WebSocket-backed worker channel.
//!
//! Every worker connection is tracked. The earliest connection is the
//! active worker and receives all dispatches; later connections wait as
//! standbys. When the active worker leaves, the oldest standby is promoted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chatrelay_core::{WorkerChannel, WorkerCommand, WorkerSendError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// Identifier of one worker connection.
pub type ConnectionId = u64;

struct Connection {
    outbound: mpsc::UnboundedSender<WorkerCommand>,
    connected_at: DateTime<Utc>,
}

#[derive(Default)]
struct HubState {
    connections: BTreeMap<ConnectionId, Connection>,
    active: Option<ConnectionId>,
}

/// Returned by [`WorkerHub::register`].
#[derive(Debug)]
pub struct Registration {
    pub id: ConnectionId,
    /// Commands to forward to this connection's socket.
    pub outbound: mpsc::UnboundedReceiver<WorkerCommand>,
    /// Whether this connection became the active worker.
    pub active: bool,
}

/// Returned by [`WorkerHub::deregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deregistration {
    pub was_active: bool,
    /// Standby that took over, if any.
    pub promoted: Option<ConnectionId>,
}

/// Connection counts for health and admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatus {
    pub active_connection: Option<ConnectionId>,
    pub active_since: Option<DateTime<Utc>>,
    pub total_connections: usize,
}

impl HubStatus {
    pub const fn is_connected(&self) -> bool {
        self.active_connection.is_some()
    }
}

/// Tracks worker connections and routes commands to the active one.
#[derive(Default)]
pub struct WorkerHub {
    state: Mutex<HubState>,
    next_id: AtomicU64,
}

impl WorkerHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection.
    pub fn register(&self) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (outbound, rx) = mpsc::unbounded_channel();

        let mut state = self.lock();
        state.connections.insert(
            id,
            Connection {
                outbound,
                connected_at: Utc::now(),
            },
        );
        let active = state.active.is_none();
        if active {
            state.active = Some(id);
        }

        Registration {
            id,
            outbound: rx,
            active,
        }
    }

    /// Forget a connection, promoting the oldest standby if it was active.
    pub fn deregister(&self, id: ConnectionId) -> Deregistration {
        let mut state = self.lock();
        state.connections.remove(&id);

        if state.active != Some(id) {
            return Deregistration {
                was_active: false,
                promoted: None,
            };
        }

        let promoted = state.connections.keys().next().copied();
        state.active = promoted;
        Deregistration {
            was_active: true,
            promoted,
        }
    }

    pub fn is_active(&self, id: ConnectionId) -> bool {
        self.lock().active == Some(id)
    }

    pub fn status(&self) -> HubStatus {
        let state = self.lock();
        HubStatus {
            active_connection: state.active,
            active_since: state
                .active
                .and_then(|id| state.connections.get(&id))
                .map(|conn| conn.connected_at),
            total_connections: state.connections.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkerChannel for WorkerHub {
    fn is_connected(&self) -> bool {
        self.lock().active.is_some()
    }

    fn send(&self, command: WorkerCommand) -> Result<(), WorkerSendError> {
        let state = self.lock();
        let connection = state
            .active
            .and_then(|id| state.connections.get(&id))
            .ok_or(WorkerSendError::NotConnected)?;
        connection
            .outbound
            .send(command)
            .map_err(|_| WorkerSendError::ChannelClosed)
    }
}

impl std::fmt::Debug for WorkerHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHub")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
