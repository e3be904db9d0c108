//! Error types and handling
//!
//! Domain-specific error enums (container runtime, readiness probing, command
//! execution) wrapped in the main DrydockError enum for unified handling. A
//! command that merely exits non-zero or overruns its timeout is not an error
//! here; those are recorded outcomes and only affect the process exit code.

use thiserror::Error;

/// Container runtime (docker/podman) errors
#[derive(Error, Debug)]
pub enum DockerError {
    /// Runtime binary is not installed or not accessible
    #[error("Container runtime is not installed or not accessible")]
    NotInstalled,

    /// Runtime CLI command error
    #[error("Container runtime CLI error: {0}")]
    CLIError(String),

    /// `run -d` produced output that is not a container id
    #[error("Could not parse container id from runtime output: {output:?}")]
    UnparseableContainerId { output: String },
}

/// Readiness probing errors
///
/// A refused connection is not an error (the service is simply not up yet);
/// this covers hard client failures that make further polling pointless.
#[derive(Error, Debug)]
pub enum ReadinessError {
    /// HTTP client failure other than a connection error
    #[error("Readiness probe failed: {message}")]
    Probe { message: String },
}

/// Wrapped command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command could not be spawned
    #[error("Failed to spawn command {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// Waiting on the command failed
    #[error("Failed to wait for command {command:?}: {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum DrydockError {
    /// Container runtime errors
    #[error("Docker error: {0}")]
    Docker(#[from] DockerError),

    /// Readiness probing errors
    #[error("Readiness error: {0}")]
    Readiness(#[from] ReadinessError),

    /// Wrapped command execution errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Container runtime selection errors
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Convenience type alias for Results with DrydockError
pub type Result<T> = std::result::Result<T, DrydockError>;
