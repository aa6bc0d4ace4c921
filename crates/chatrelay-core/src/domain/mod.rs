//! Domain types for relayed chat requests.
//!
//! These are pure types with no transport dependencies. The worker protocol
//! lives here too so that both the scheduler and the transport adapter agree
//! on a single wire shape.

mod request;
mod worker;

pub use request::{
    ChatRequest, Completion, CompletionHandle, CompletionReceiver, GenerationSettings, Outcome,
    RequestId, RequestIdAllocator,
};
pub use worker::{WorkerCommand, WorkerEvent};
