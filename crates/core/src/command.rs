//! Wrapped command execution
//!
//! Runs the caller-supplied command with inherited stdio under a wall-clock
//! timeout. A non-zero exit or a timeout is an outcome, not an error: the
//! image loop keeps going and folds it into the final exit code.

use crate::errors::{CommandError, Result};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The command to run once a container is ready
#[derive(Debug, Clone)]
pub struct TestCommand {
    /// Program to execute
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Wall-clock limit for a single run
    pub timeout: Duration,
}

/// Result of one command run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command exited on its own
    Exited { code: i32 },
    /// The command overran its timeout and was killed
    TimedOut,
}

impl CommandOutcome {
    /// Whether this run counts as a success
    pub fn success(&self) -> bool {
        matches!(self, CommandOutcome::Exited { code: 0 })
    }
}

/// Run the command with inherited stdio, killing it at the timeout
///
/// The command talks to the containerized service directly; its stdout and
/// stderr stay attached to ours. A signal-killed command reports no exit code
/// and is mapped to -1.
#[instrument(skip(command), fields(program = %command.program))]
pub async fn run_with_timeout(command: &TestCommand) -> Result<CommandOutcome> {
    debug!(args = ?command.args, timeout = ?command.timeout, "Running command");

    let mut child = tokio::process::Command::new(&command.program)
        .args(&command.args)
        .spawn()
        .map_err(|e| CommandError::Spawn {
            command: command.program.clone(),
            source: e,
        })?;

    match tokio::time::timeout(command.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let code = status.code().unwrap_or(-1);
            debug!("Command exited with code {}", code);
            Ok(CommandOutcome::Exited { code })
        }
        Ok(Err(e)) => Err(CommandError::Wait {
            command: command.program.clone(),
            source: e,
        }
        .into()),
        Err(_) => {
            warn!("Command exceeded timeout of {:?}, killing it", command.timeout);
            if let Err(e) = child.kill().await {
                // The child may have exited between the timeout firing and the kill
                warn!("Failed to kill timed out command: {}", e);
            }
            Ok(CommandOutcome::TimedOut)
        }
    }
}
