//! Container runtime selection for Docker/Podman
//!
//! Both runtimes expose the same CLI surface for the subcommands this tool
//! uses (`run`, `kill`, `logs`, `rm`), so selection only decides which binary
//! a [`CliRuntime`](crate::docker::CliRuntime) invokes.

use crate::docker::CliRuntime;
use crate::errors::DrydockError;

/// Runtime selection options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    /// Docker runtime
    Docker,
    /// Podman runtime
    Podman,
}

impl RuntimeKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }
}

impl std::str::FromStr for RuntimeKind {
    type Err = DrydockError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "podman" => Ok(Self::Podman),
            _ => Err(DrydockError::Runtime(format!(
                "Unknown runtime: {}. Supported runtimes: docker, podman",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime factory for creating container runtime instances
pub struct RuntimeFactory;

impl RuntimeFactory {
    /// Detect runtime from CLI flag, environment variable, or default
    ///
    /// Precedence: CLI flag > DRYDOCK_RUNTIME env var > default (docker)
    pub fn detect_runtime(cli_runtime: Option<RuntimeKind>) -> RuntimeKind {
        if let Some(runtime) = cli_runtime {
            return runtime;
        }

        if let Ok(env_runtime) = std::env::var("DRYDOCK_RUNTIME") {
            if let Ok(runtime) = env_runtime.parse() {
                return runtime;
            }
        }

        // Default to Docker
        RuntimeKind::Docker
    }

    /// Create a runtime instance for the given kind
    pub fn create_runtime(kind: RuntimeKind) -> CliRuntime {
        match kind {
            RuntimeKind::Docker => CliRuntime::docker(),
            RuntimeKind::Podman => CliRuntime::podman(),
        }
    }

    /// Create a runtime instance for an explicit binary path
    ///
    /// Used by `--docker-path`, which overrides kind selection entirely.
    pub fn create_runtime_with_path(path: String) -> CliRuntime {
        CliRuntime::with_runtime_path(path)
    }
}
