//! Core library for the drydock CLI
//!
//! This crate contains the container lifecycle machinery: runtime CLI
//! integration, HTTP readiness polling, wrapped command execution, session
//! teardown guarantees, logging, and error handling.

pub mod command;
pub mod docker;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod readiness;
pub mod runtime;
pub mod session;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
