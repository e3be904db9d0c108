//! Container runtime CLI integration
//!
//! Wraps the `docker`/`podman` command line for the container operations this
//! tool needs: detached run, kill, log collection, and removal. All calls shell
//! out to the runtime binary; no daemon API client is used.

use crate::errors::{DockerError, Result};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use tracing::{debug, instrument, warn};

/// Container runtime abstraction trait
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// Health check for runtime availability
    async fn ping(&self) -> Result<()>;

    /// Start a container in detached mode and return its id
    ///
    /// `run_opts` are placed before the image name, `run_args` after it,
    /// both forwarded verbatim.
    async fn run_detached(
        &self,
        image: &str,
        run_opts: &[String],
        run_args: &[String],
    ) -> Result<String>;

    /// Kill a running container
    async fn kill(&self, container_id: &str) -> Result<()>;

    /// Collect the container's captured stdout log lines
    async fn logs(&self, container_id: &str) -> Result<Vec<String>>;

    /// Remove a container
    async fn remove(&self, container_id: &str) -> Result<()>;

    /// Display name of this runtime (e.g., "docker", "podman")
    fn runtime_name(&self) -> &str;
}

// Implement ContainerRuntime for references to types that implement it

impl<T: ContainerRuntime> ContainerRuntime for &T {
    async fn ping(&self) -> Result<()> {
        (*self).ping().await
    }

    async fn run_detached(
        &self,
        image: &str,
        run_opts: &[String],
        run_args: &[String],
    ) -> Result<String> {
        (*self).run_detached(image, run_opts, run_args).await
    }

    async fn kill(&self, container_id: &str) -> Result<()> {
        (*self).kill(container_id).await
    }

    async fn logs(&self, container_id: &str) -> Result<Vec<String>> {
        (*self).logs(container_id).await
    }

    async fn remove(&self, container_id: &str) -> Result<()> {
        (*self).remove(container_id).await
    }

    fn runtime_name(&self) -> &str {
        (*self).runtime_name()
    }
}

/// Generic CLI-based container runtime implementation
///
/// This can be used for both Docker and Podman runtimes since they share
/// a compatible CLI interface for the subcommands used here.
#[derive(Debug, Clone)]
pub struct CliRuntime {
    /// Container runtime CLI binary path (e.g., "docker" or "podman")
    runtime_path: String,
}

impl CliRuntime {
    /// Create a new CliRuntime for Docker
    pub fn docker() -> Self {
        Self {
            runtime_path: "docker".to_string(),
        }
    }

    /// Create a new CliRuntime for Podman
    pub fn podman() -> Self {
        Self {
            runtime_path: "podman".to_string(),
        }
    }

    /// Create a new CliRuntime with custom runtime binary path
    pub fn with_runtime_path(runtime_path: String) -> Self {
        Self { runtime_path }
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        Self::docker()
    }
}

/// Build the full `run` argument vector: opts before the image, args after
fn build_run_args(image: &str, run_opts: &[String], run_args: &[String]) -> Vec<String> {
    let mut args: Vec<String> = vec!["run".to_string(), "-d".to_string()];
    args.extend(run_opts.iter().cloned());
    args.push(image.to_string());
    args.extend(run_args.iter().cloned());
    args
}

/// Parse the container id printed by `run -d`
///
/// The runtime prints the id as a single line on stdout; anything else
/// (empty output, multiple tokens) means the launch cannot be tracked.
fn parse_container_id(stdout: &str) -> std::result::Result<String, DockerError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(DockerError::UnparseableContainerId {
            output: stdout.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

impl ContainerRuntime for CliRuntime {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<()> {
        debug!("Pinging container runtime");

        tokio::task::spawn_blocking({
            let runtime_path = self.runtime_path.clone();
            move || {
                let output = Command::new(&runtime_path)
                    .args(["version", "--format", "json"])
                    .output();

                match output {
                    Ok(output) => {
                        if output.status.success() {
                            debug!("Container runtime is available");
                            Ok(())
                        } else {
                            let stderr = String::from_utf8_lossy(&output.stderr);
                            Err(
                                DockerError::CLIError(format!("Runtime ping failed: {}", stderr))
                                    .into(),
                            )
                        }
                    }
                    Err(e) => {
                        debug!("Runtime ping failed: {}", e);
                        Err(DockerError::NotInstalled.into())
                    }
                }
            }
        })
        .await
        .map_err(|e| DockerError::CLIError(format!("Task join error: {}", e)))?
    }

    #[instrument(skip(self, run_opts, run_args))]
    async fn run_detached(
        &self,
        image: &str,
        run_opts: &[String],
        run_args: &[String],
    ) -> Result<String> {
        debug!("Starting detached container for image: {}", image);

        let args = build_run_args(image, run_opts, run_args);
        let runtime_path = self.runtime_path.clone();

        let container_id = tokio::task::spawn_blocking(move || {
            let output = Command::new(&runtime_path)
                .args(&args)
                .output()
                .map_err(|e| DockerError::CLIError(format!("Failed to run container: {}", e)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(DockerError::CLIError(format!(
                    "Run command failed: {}",
                    stderr
                )));
            }

            let stdout = String::from_utf8(output.stdout).map_err(|e| {
                DockerError::CLIError(format!("Invalid UTF-8 in runtime output: {}", e))
            })?;

            parse_container_id(&stdout)
        })
        .await
        .map_err(|e| DockerError::CLIError(format!("Task join error: {}", e)))??;

        debug!("Started container with ID: {}", container_id);
        Ok(container_id)
    }

    #[instrument(skip(self))]
    async fn kill(&self, container_id: &str) -> Result<()> {
        debug!("Killing container: {}", container_id);

        let runtime_path = self.runtime_path.clone();
        let container_id = container_id.to_string();

        tokio::task::spawn_blocking(move || -> std::result::Result<(), DockerError> {
            let output = Command::new(&runtime_path)
                .args(["kill", &container_id])
                .output()
                .map_err(|e| DockerError::CLIError(format!("Failed to kill container: {}", e)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(DockerError::CLIError(format!(
                    "Kill command failed: {}",
                    stderr
                )));
            }

            Ok(())
        })
        .await
        .map_err(|e| DockerError::CLIError(format!("Task join error: {}", e)))?
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn logs(&self, container_id: &str) -> Result<Vec<String>> {
        debug!("Collecting logs for container: {}", container_id);

        let runtime_path = self.runtime_path.clone();
        let container_id = container_id.to_string();

        tokio::task::spawn_blocking(move || -> std::result::Result<Vec<String>, DockerError> {
            // Pipe stdout for line collection; the container's stderr stream
            // passes through untouched.
            let mut child = Command::new(&runtime_path)
                .args(["logs", &container_id])
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|e| DockerError::CLIError(format!("Failed to collect logs: {}", e)))?;

            let mut lines = Vec::new();
            if let Some(stdout) = child.stdout.take() {
                let reader = BufReader::new(stdout);
                for line in reader.lines() {
                    let line = line.map_err(|e| {
                        DockerError::CLIError(format!("Failed to read log output: {}", e))
                    })?;
                    lines.push(line);
                }
            }

            let status = child.wait().map_err(|e| {
                DockerError::CLIError(format!("Failed to wait for logs command: {}", e))
            })?;
            if !status.success() {
                // Log collection is best-effort during teardown; it must not
                // mask the failure that got us here.
                warn!("Logs command exited with status {}", status);
            }

            Ok(lines)
        })
        .await
        .map_err(|e| DockerError::CLIError(format!("Task join error: {}", e)))?
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn remove(&self, container_id: &str) -> Result<()> {
        debug!("Removing container: {}", container_id);

        let runtime_path = self.runtime_path.clone();
        let container_id = container_id.to_string();

        tokio::task::spawn_blocking(move || -> std::result::Result<(), DockerError> {
            let output = Command::new(&runtime_path)
                .args(["rm", &container_id])
                .output()
                .map_err(|e| DockerError::CLIError(format!("Failed to remove container: {}", e)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(DockerError::CLIError(format!(
                    "Remove command failed: {}",
                    stderr
                )));
            }

            Ok(())
        })
        .await
        .map_err(|e| DockerError::CLIError(format!("Task join error: {}", e)))?
        .map_err(Into::into)
    }

    fn runtime_name(&self) -> &str {
        std::path::Path::new(&self.runtime_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.runtime_path)
    }
}

pub mod mock {
    //! Mock container runtime for testing lifecycle flows
    //!
    //! Provides a scripted implementation of the ContainerRuntime trait for
    //! testing without a real runtime binary. Every call is recorded so tests
    //! can assert the exact operation sequence a lifecycle produced.

    use crate::docker::ContainerRuntime;
    use crate::errors::{DockerError, Result};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tracing::debug;

    /// Record of a runtime call for verification in tests
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockCall {
        /// Health check
        Ping,
        /// Detached run with the forwarded opts and args
        Run {
            image: String,
            run_opts: Vec<String>,
            run_args: Vec<String>,
        },
        /// Kill of a container
        Kill { container_id: String },
        /// Log collection for a container
        Logs { container_id: String },
        /// Removal of a container
        Remove { container_id: String },
    }

    /// Configuration for the MockRuntime
    #[derive(Debug, Clone)]
    pub struct MockRuntimeConfig {
        /// Whether ping should succeed
        pub ping_success: bool,
        /// Images whose launch should fail, with the error message to return
        pub launch_failures: HashMap<String, String>,
        /// Whether kill should fail
        pub kill_failure: bool,
        /// Whether remove should fail
        pub remove_failure: bool,
        /// Log lines returned for every container
        pub log_lines: Vec<String>,
    }

    impl Default for MockRuntimeConfig {
        fn default() -> Self {
            Self {
                ping_success: true,
                launch_failures: HashMap::new(),
                kill_failure: false,
                remove_failure: false,
                log_lines: Vec::new(),
            }
        }
    }

    /// Mock container runtime implementation
    #[derive(Debug)]
    pub struct MockRuntime {
        /// Configuration for mock behavior
        config: Arc<Mutex<MockRuntimeConfig>>,
        /// History of calls made (for testing verification)
        calls: Arc<Mutex<Vec<MockCall>>>,
        /// Counter for generated container ids
        next_container: Arc<Mutex<u32>>,
    }

    impl MockRuntime {
        /// Create a new MockRuntime with default configuration
        pub fn new() -> Self {
            Self::with_config(MockRuntimeConfig::default())
        }

        /// Create a new MockRuntime with the given configuration
        pub fn with_config(config: MockRuntimeConfig) -> Self {
            Self {
                config: Arc::new(Mutex::new(config)),
                calls: Arc::new(Mutex::new(Vec::new())),
                next_container: Arc::new(Mutex::new(0)),
            }
        }

        /// Get the history of calls made to this runtime
        pub fn calls(&self) -> Vec<MockCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Get the ids of containers launched so far, in launch order
        pub fn launched_ids(&self) -> Vec<String> {
            let count = *self.next_container.lock().unwrap();
            (1..=count)
                .map(|n| format!("mock-container-{}", n))
                .collect()
        }

        fn record(&self, call: MockCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Default for MockRuntime {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ContainerRuntime for MockRuntime {
        async fn ping(&self) -> Result<()> {
            self.record(MockCall::Ping);
            if self.config.lock().unwrap().ping_success {
                Ok(())
            } else {
                Err(DockerError::NotInstalled.into())
            }
        }

        async fn run_detached(
            &self,
            image: &str,
            run_opts: &[String],
            run_args: &[String],
        ) -> Result<String> {
            self.record(MockCall::Run {
                image: image.to_string(),
                run_opts: run_opts.to_vec(),
                run_args: run_args.to_vec(),
            });

            if let Some(message) = self.config.lock().unwrap().launch_failures.get(image) {
                return Err(DockerError::CLIError(message.clone()).into());
            }

            let mut next = self.next_container.lock().unwrap();
            *next += 1;
            let container_id = format!("mock-container-{}", *next);
            debug!("Mock launched container: {}", container_id);
            Ok(container_id)
        }

        async fn kill(&self, container_id: &str) -> Result<()> {
            self.record(MockCall::Kill {
                container_id: container_id.to_string(),
            });
            if self.config.lock().unwrap().kill_failure {
                return Err(DockerError::CLIError(format!(
                    "Kill command failed: no such container: {}",
                    container_id
                ))
                .into());
            }
            Ok(())
        }

        async fn logs(&self, container_id: &str) -> Result<Vec<String>> {
            self.record(MockCall::Logs {
                container_id: container_id.to_string(),
            });
            Ok(self.config.lock().unwrap().log_lines.clone())
        }

        async fn remove(&self, container_id: &str) -> Result<()> {
            self.record(MockCall::Remove {
                container_id: container_id.to_string(),
            });
            if self.config.lock().unwrap().remove_failure {
                return Err(DockerError::CLIError(format!(
                    "Remove command failed: no such container: {}",
                    container_id
                ))
                .into());
            }
            Ok(())
        }

        fn runtime_name(&self) -> &str {
            "docker"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_run_args_ordering() {
        let run_opts = vec![
            "--env=AWS_ACCESS_KEY_ID=demo".to_string(),
            "-p=80:5000".to_string(),
        ];
        let run_args = vec!["--verbose".to_string()];
        let args = build_run_args("ceph/demo", &run_opts, &run_args);

        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--env=AWS_ACCESS_KEY_ID=demo",
                "-p=80:5000",
                "ceph/demo",
                "--verbose"
            ]
        );
    }

    #[test]
    fn test_build_run_args_minimal() {
        let args = build_run_args("nginx", &[], &[]);
        assert_eq!(args, vec!["run", "-d", "nginx"]);
    }

    #[test]
    fn test_parse_container_id() {
        let id = parse_container_id("abcdef0123456789\n").unwrap();
        assert_eq!(id, "abcdef0123456789");

        assert!(parse_container_id("").is_err());
        assert!(parse_container_id("   \n").is_err());
        assert!(parse_container_id("pulling layer\nabcdef0123456789\n").is_err());
    }

    #[test]
    fn test_cli_runtime_constructors() {
        assert_eq!(CliRuntime::docker().runtime_name(), "docker");
        assert_eq!(CliRuntime::podman().runtime_name(), "podman");
        assert_eq!(CliRuntime::default().runtime_name(), "docker");

        let custom = CliRuntime::with_runtime_path("/usr/local/bin/podman".to_string());
        assert_eq!(custom.runtime_name(), "podman");
    }

    #[tokio::test]
    async fn test_mock_runtime_records_calls() {
        use mock::{MockCall, MockRuntime};

        let runtime = MockRuntime::new();
        let id = runtime
            .run_detached("demo/img", &["--env=X=1".to_string()], &[])
            .await
            .unwrap();
        runtime.kill(&id).await.unwrap();
        runtime.logs(&id).await.unwrap();
        runtime.remove(&id).await.unwrap();

        let calls = runtime.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(calls[0], MockCall::Run { .. }));
        assert_eq!(
            calls[1],
            MockCall::Kill {
                container_id: id.clone()
            }
        );
        assert_eq!(
            calls[2],
            MockCall::Logs {
                container_id: id.clone()
            }
        );
        assert_eq!(calls[3], MockCall::Remove { container_id: id });
    }

    #[tokio::test]
    async fn test_mock_runtime_launch_failure() {
        use mock::{MockRuntime, MockRuntimeConfig};

        let mut config = MockRuntimeConfig::default();
        config
            .launch_failures
            .insert("bad/image".to_string(), "no such image".to_string());
        let runtime = MockRuntime::with_config(config);

        assert!(runtime.run_detached("bad/image", &[], &[]).await.is_err());
        assert!(runtime.run_detached("good/image", &[], &[]).await.is_ok());
    }
}
