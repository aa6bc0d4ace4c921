//! `chatrelay` command-line interface.
//!
//! Argument definitions, the composition root for config access, and the
//! command handlers. `main.rs` only parses, initializes logging and
//! dispatches.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::{Commands, ServeArgs};
pub use config_commands::ConfigCommand;
pub use parser::Cli;
