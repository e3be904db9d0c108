//! Container session lifecycle
//!
//! A [`Session`] is an acquired container: it exists only after a successful
//! detached launch, and teardown consumes it. That makes "the identifier is
//! assigned exactly once" and "a container is torn down at most once"
//! properties of the types rather than of careful call sites.

use crate::docker::ContainerRuntime;
use crate::errors::Result;
use crate::readiness::{self, ReadinessProbe, DEFAULT_POLL_INTERVAL, DEFAULT_READY_GRACE};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default settle period between killing a container and collecting its logs
///
/// Gives the runtime time to capture the service's final output before the
/// log stream is read.
pub const DEFAULT_TEARDOWN_SETTLE: Duration = Duration::from_secs(30);

/// A desired container launch
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Image to run
    pub image: String,
    /// Extra options placed before the image name, forwarded verbatim
    pub run_opts: Vec<String>,
    /// Extra arguments placed after the image name, forwarded verbatim
    pub run_args: Vec<String>,
    /// Port the service inside the container listens on
    pub port: u16,
}

/// Lifecycle timing configuration
///
/// Defaults match production behavior; tests inject millisecond values to
/// run lifecycles without real delays.
#[derive(Debug, Clone)]
pub struct SessionTiming {
    /// Interval between readiness probes
    pub poll_interval: Duration,
    /// Settle period after the first successful probe
    pub ready_grace: Duration,
    /// Settle period between kill and log collection
    pub teardown_settle: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            ready_grace: DEFAULT_READY_GRACE,
            teardown_settle: DEFAULT_TEARDOWN_SETTLE,
        }
    }
}

/// A launched container
#[derive(Debug)]
pub struct Session {
    image: String,
    port: u16,
    container_id: String,
}

impl Session {
    /// Launch a detached container for the request
    ///
    /// On failure there is nothing to tear down: no identifier was produced.
    #[instrument(skip(runtime, request), fields(image = %request.image))]
    pub async fn launch<R: ContainerRuntime>(runtime: &R, request: &RunRequest) -> Result<Session> {
        println!("starting container for {:?}", request.image);

        let container_id = runtime
            .run_detached(&request.image, &request.run_opts, &request.run_args)
            .await?;
        debug!(container_id = %container_id, "Container launched");

        Ok(Session {
            image: request.image.clone(),
            port: request.port,
            container_id,
        })
    }

    /// The runtime-assigned container identifier
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Abbreviated identifier used to tag surfaced log lines
    pub fn short_id(&self) -> &str {
        self.container_id.get(..12).unwrap_or(&self.container_id)
    }

    /// Block until the service inside answers HTTP on the session port
    pub async fn await_ready<P: ReadinessProbe + ?Sized>(
        &self,
        probe: &P,
        timing: &SessionTiming,
    ) -> Result<()> {
        readiness::wait_for_ready(
            probe,
            self.port,
            &self.container_id,
            &self.image,
            timing.poll_interval,
            timing.ready_grace,
        )
        .await
    }

    /// Kill the container, surface its logs, and remove it
    ///
    /// Consumes the session. Log lines are printed before removal so they
    /// are surfaced even when removal fails; kill and remove failures
    /// propagate.
    #[instrument(skip(self, runtime, timing), fields(container_id = %self.container_id))]
    pub async fn teardown<R: ContainerRuntime>(
        self,
        runtime: &R,
        timing: &SessionTiming,
    ) -> Result<()> {
        println!(
            "terminating {} container {:?} (image {:?})",
            runtime.runtime_name(),
            self.container_id,
            self.image
        );
        runtime.kill(&self.container_id).await?;

        tokio::time::sleep(timing.teardown_settle).await;

        let prefix = format!("{} {}:", runtime.runtime_name(), self.short_id());
        for line in runtime.logs(&self.container_id).await? {
            println!("{} {}", prefix, line);
        }

        runtime.remove(&self.container_id).await?;
        debug!("Container removed");
        Ok(())
    }
}
