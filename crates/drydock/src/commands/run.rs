//! Run command implementation
//!
//! Drives the full lifecycle for every requested image: launch a detached
//! container, wait for it to answer HTTP, run the test command, and tear the
//! container down with its logs echoed to stdout.

use anyhow::Result;
use drydock_core::command::TestCommand;
use drydock_core::docker::ContainerRuntime;
use drydock_core::lifecycle::{self, RunSummary};
use drydock_core::readiness::HttpProbe;
use drydock_core::runtime::{RuntimeFactory, RuntimeKind};
use drydock_core::session::{RunRequest, SessionTiming};
use std::time::Duration;
use tracing::{debug, instrument};

/// Run command arguments
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Images to test, one lifecycle per image
    pub images: Vec<String>,
    /// Extra options passed to `run` before the image
    pub run_opts: Vec<String>,
    /// Arguments passed to the container entrypoint after the image
    pub run_args: Vec<String>,
    /// HTTP port polled on localhost until the container answers
    pub port: u16,
    /// Test command program
    pub command: String,
    /// Test command arguments
    pub command_args: Vec<String>,
    /// Time limit for each test command run
    pub timeout: Duration,
    /// Poll, grace and settle durations
    pub timing: SessionTiming,
    /// Runtime selected via --runtime (env var applies when absent)
    pub runtime: Option<RuntimeKind>,
    /// Explicit runtime executable path, overrides runtime selection
    pub docker_path: Option<String>,
}

/// Execute the run command
#[instrument(skip(args))]
pub async fn execute_run(args: RunArgs) -> Result<RunSummary> {
    debug!("Starting run command execution");
    debug!("Run args: {:?}", args);

    let runtime = match args.docker_path {
        Some(path) => RuntimeFactory::create_runtime_with_path(path),
        None => {
            let kind = RuntimeFactory::detect_runtime(args.runtime);
            RuntimeFactory::create_runtime(kind)
        }
    };
    runtime.ping().await?;

    let probe = HttpProbe::new()?;
    let command = TestCommand {
        program: args.command,
        args: args.command_args,
        timeout: args.timeout,
    };
    let requests: Vec<RunRequest> = args
        .images
        .into_iter()
        .map(|image| RunRequest {
            image,
            run_opts: args.run_opts.clone(),
            run_args: args.run_args.clone(),
            port: args.port,
        })
        .collect();

    let summary = lifecycle::run_images(&runtime, &probe, &requests, &command, &args.timing).await?;
    Ok(summary)
}
