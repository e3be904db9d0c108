//! Per-image lifecycle orchestration
//!
//! Drives launch, readiness wait, command run, and teardown for each
//! requested image, strictly in order, folding command outcomes into a
//! [`RunSummary`]. Once a container is launched its teardown runs on every
//! path; a teardown failure takes precedence over the phase failure it may
//! be covering, matching scope-exit semantics.

use crate::command::{self, CommandOutcome, TestCommand};
use crate::docker::ContainerRuntime;
use crate::errors::Result;
use crate::readiness::ReadinessProbe;
use crate::session::{RunRequest, Session, SessionTiming};
use tracing::{debug, info, instrument};

/// Aggregate result of a full run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Images whose command succeeded
    pub passed: usize,
    /// Images whose command failed or timed out
    pub failed: usize,
}

impl RunSummary {
    /// Whether every image's command succeeded
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Total images processed
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    fn record(&mut self, outcome: &CommandOutcome) {
        if outcome.success() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Run the full lifecycle for one image
///
/// Launch, then readiness and the command with the session held, then
/// teardown unconditionally. Launch failures propagate without teardown
/// (nothing was acquired); readiness and command-spawn failures tear down
/// first and propagate after.
#[instrument(skip_all, fields(image = %request.image))]
pub async fn run_image<R, P>(
    runtime: &R,
    probe: &P,
    request: &RunRequest,
    command: &TestCommand,
    timing: &SessionTiming,
) -> Result<CommandOutcome>
where
    R: ContainerRuntime,
    P: ReadinessProbe + ?Sized,
{
    let session = Session::launch(runtime, request).await?;

    // Capture the phase result so teardown runs no matter how this went
    let phase_result = ready_then_run(&session, probe, command, timing).await;

    session.teardown(runtime, timing).await?;
    phase_result
}

async fn ready_then_run<P: ReadinessProbe + ?Sized>(
    session: &Session,
    probe: &P,
    command: &TestCommand,
    timing: &SessionTiming,
) -> Result<CommandOutcome> {
    session.await_ready(probe, timing).await?;
    command::run_with_timeout(command).await
}

/// Run the lifecycle for every image in order, accumulating the worst result
///
/// A failed or timed-out command is recorded and the loop continues to the
/// next image; launch, readiness, and teardown failures abort the remaining
/// images immediately.
#[instrument(skip_all, fields(images = requests.len()))]
pub async fn run_images<R, P>(
    runtime: &R,
    probe: &P,
    requests: &[RunRequest],
    command: &TestCommand,
    timing: &SessionTiming,
) -> Result<RunSummary>
where
    R: ContainerRuntime,
    P: ReadinessProbe + ?Sized,
{
    let mut summary = RunSummary::default();

    for request in requests {
        let outcome = run_image(runtime, probe, request, command, timing).await?;
        if outcome == CommandOutcome::TimedOut {
            println!(
                "ERROR: command {:?} timed out after {} seconds",
                command.program,
                command.timeout.as_secs()
            );
        }
        summary.record(&outcome);
        debug!(image = %request.image, ?outcome, "Image lifecycle complete");
    }

    info!(
        passed = summary.passed,
        failed = summary.failed,
        "Run complete"
    );
    Ok(summary)
}
