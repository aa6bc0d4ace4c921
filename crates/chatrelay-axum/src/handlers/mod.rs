//! HTTP and WebSocket handlers.

pub mod admin;
pub mod chat;
pub mod health;
pub mod worker_ws;
