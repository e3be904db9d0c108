use crate::commands;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use drydock_core::lifecycle::RunSummary;
use drydock_core::session::SessionTiming;
use std::time::Duration;

/// Runtime selection options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum RuntimeOption {
    /// Docker runtime
    Docker,
    /// Podman runtime
    Podman,
}

impl From<RuntimeOption> for drydock_core::runtime::RuntimeKind {
    fn from(runtime: RuntimeOption) -> Self {
        match runtime {
            RuntimeOption::Docker => drydock_core::runtime::RuntimeKind::Docker,
            RuntimeOption::Podman => drydock_core::runtime::RuntimeKind::Podman,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version,
    about = "Container smoke-test runner",
    long_about = "Container smoke-test runner\n\nLaunches each given image with the container runtime, waits for it to answer HTTP on the chosen port, runs a test command against it, and tears the container down again. Exits non-zero if any command failed.",
    after_help = "Example:\n  \
        Run the ceph/demo image with two credentials passed to `run`, wait for it to\n  \
        answer HTTP on port 80, then run the s3 test suite against it:\n\n  \
        drydock --docker-image ceph/demo --run-opt=--env=CEPH_DEMO_ACCESS_KEY=access_key \\\n      \
        --run-opt=--env=CEPH_DEMO_SECRET_KEY=secret_key -- cargo test --features s3",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    /// Image to test (can be specified multiple times; the command runs once per image)
    #[arg(long = "docker-image", value_name = "IMAGE", required = true)]
    pub docker_image: Vec<String>,

    /// Extra option passed to `run` before the image (can be specified multiple times)
    #[arg(long = "run-opt", value_name = "OPT", allow_hyphen_values = true)]
    pub run_opt: Vec<String>,

    /// Argument passed to the container entrypoint after the image (can be specified multiple times)
    #[arg(long = "run-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub run_arg: Vec<String>,

    /// HTTP port polled on localhost until the container answers
    #[arg(long, value_name = "PORT", default_value_t = 80, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Seconds the test command may run before it is killed
    #[arg(long, value_name = "SECONDS", default_value_t = 600)]
    pub timeout: u64,

    /// Log format (text or json, defaults to text, can be set via DRYDOCK_LOG_FORMAT env var)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Container runtime to use (docker or podman, can be set via DRYDOCK_RUNTIME env var)
    #[arg(long, value_enum)]
    pub runtime: Option<RuntimeOption>,

    /// Path to the container runtime executable (overrides --runtime)
    #[arg(long, value_name = "PATH")]
    pub docker_path: Option<String>,

    /// Readiness poll interval in milliseconds (testing)
    #[arg(long, value_name = "MS", hide = true)]
    pub poll_interval_ms: Option<u64>,

    /// Grace period after first successful poll in milliseconds (testing)
    #[arg(long, value_name = "MS", hide = true)]
    pub ready_grace_ms: Option<u64>,

    /// Settle period between kill and log collection in milliseconds (testing)
    #[arg(long, value_name = "MS", hide = true)]
    pub teardown_settle_ms: Option<u64>,

    /// Test command to run against each container
    #[arg(value_name = "COMMAND", required = true)]
    pub command: String,

    /// Arguments for the test command
    #[arg(value_name = "ARG", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Dispatch CLI commands to their implementations.
    ///
    /// Initializes logging from the global options, then hands the run
    /// arguments to the command implementation. Returns the per-image
    /// summary so `main` can derive the process exit code from it.
    pub async fn dispatch(self) -> Result<RunSummary> {
        // Initialize logging based on global options
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None, // Let logging module check environment variable
        };

        let log_level = match self.log_level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        // Set environment variable for log level before initializing logging
        if std::env::var_os("DRYDOCK_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var(
                "RUST_LOG",
                format!("drydock={},drydock_core={}", log_level, log_level),
            );
        }
        drydock_core::logging::init(log_format)?;

        tracing::debug!("CLI initialized with log level: {}", log_level);

        let timing = self.session_timing();
        let args = commands::run::RunArgs {
            images: self.docker_image,
            run_opts: self.run_opt,
            run_args: self.run_arg,
            port: self.port,
            command: self.command,
            command_args: self.args,
            timeout: Duration::from_secs(self.timeout),
            timing,
            runtime: self.runtime.map(Into::into),
            docker_path: self.docker_path,
        };
        commands::run::execute_run(args).await
    }

    fn session_timing(&self) -> SessionTiming {
        let mut timing = SessionTiming::default();
        if let Some(ms) = self.poll_interval_ms {
            timing.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.ready_grace_ms {
            timing.ready_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = self.teardown_settle_ms {
            timing.teardown_settle = Duration::from_millis(ms);
        }
        timing
    }
}
