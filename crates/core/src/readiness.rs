//! HTTP readiness polling
//!
//! A launched container counts as ready once the service inside answers an
//! HTTP request on the target port. The status code is irrelevant: a 500 from
//! a still-warming service proves something is listening, which is all the
//! caller asked about. Only connection errors keep the poll loop going.

use crate::errors::{ReadinessError, Result};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default interval between readiness probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default settle period after the first successful probe
pub const DEFAULT_READY_GRACE: Duration = Duration::from_secs(5);

/// Outcome of a single readiness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The service answered an HTTP request
    Ready,
    /// Nothing is accepting connections yet
    NotReady,
}

/// One-shot readiness check against the service port
#[async_trait::async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Issue a single probe against the service
    async fn check(&self, port: u16) -> Result<ProbeStatus>;
}

/// HTTP GET probe backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a new probe with default configuration (no request timeout)
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            ReadinessError::Probe {
                message: format!("Failed to build HTTP client: {}", e),
            }
        })?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ReadinessProbe for HttpProbe {
    async fn check(&self, port: u16) -> Result<ProbeStatus> {
        let url = format!("http://localhost:{}", port);
        match self.client.get(&url).send().await {
            Ok(response) => {
                debug!("Service answered with status: {}", response.status());
                Ok(ProbeStatus::Ready)
            }
            Err(e) if e.is_connect() => Ok(ProbeStatus::NotReady),
            Err(e) => Err(ReadinessError::Probe {
                message: e.to_string(),
            }
            .into()),
        }
    }
}

/// Block until the service inside the container answers HTTP
///
/// Sleeps one poll interval before every probe (a fresh container needs a
/// moment before anything listens), printing a waiting line while the port is
/// unreachable. After the first answer, prints the grace message and sleeps
/// `ready_grace` so the service can finish its own setup. There is no upper
/// bound on the number of attempts; a service that never listens blocks
/// indefinitely.
#[instrument(skip(probe))]
pub async fn wait_for_ready<P: ReadinessProbe + ?Sized>(
    probe: &P,
    port: u16,
    container_id: &str,
    image: &str,
    poll_interval: Duration,
    ready_grace: Duration,
) -> Result<()> {
    loop {
        tokio::time::sleep(poll_interval).await;
        match probe.check(port).await? {
            ProbeStatus::Ready => break,
            ProbeStatus::NotReady => {
                println!(
                    "waiting for container {:?} (image: {:?}) to become ready",
                    container_id, image
                );
            }
        }
    }

    println!(
        "container ready, waiting another {} seconds to ensure everything is set up",
        ready_grace.as_secs()
    );
    tokio::time::sleep(ready_grace).await;
    Ok(())
}
