//! Caller-facing wire contracts.

pub mod http;
