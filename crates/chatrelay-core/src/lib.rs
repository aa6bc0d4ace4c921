//! Core domain types and ports for chatrelay.
//!
//! chatrelay relays OpenAI-style chat completion requests to exactly one
//! connected worker process. This crate holds everything that does not depend
//! on a transport or a runtime adapter:
//!
//! - [`domain`]: requests, completion handles and the worker wire protocol
//! - [`config`]: the server configuration model and its validation rules
//! - [`ports`]: trait abstractions for the worker channel and config storage
//! - [`services`]: the [`ConfigStore`] that publishes config snapshots
//! - [`aggregate`]: chunk assembly for in-flight responses
//! - [`contracts`]: caller-facing HTTP request/response envelopes

#![deny(unsafe_code)]

pub mod aggregate;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod errors;
pub mod paths;
pub mod ports;
pub mod services;
pub mod storage;

// Re-export commonly used types for convenience
pub use aggregate::ResponseAggregator;
pub use config::{
    AdmissionPolicy, ConfigError, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_MS, ServerConfig,
    ServerConfigUpdate, validate_config,
};
pub use domain::{
    ChatRequest, Completion, CompletionHandle, CompletionReceiver, GenerationSettings, Outcome,
    RequestId, RequestIdAllocator, WorkerCommand, WorkerEvent,
};
pub use errors::{RelayError, WorkerEventError};
pub use paths::{PathError, data_root, default_config_path};
pub use ports::{ConfigRepository, CoreError, RepositoryError, WorkerChannel, WorkerSendError};
pub use services::{ConfigStore, ConfigUpdateOutcome};
pub use storage::{InMemoryConfigRepository, JsonFileConfigRepository};
pub use contracts::http::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorResponse,
    RequestValidationError,
};
