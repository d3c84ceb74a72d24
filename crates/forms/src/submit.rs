//! Asynchronous hand-off of a validated record.
//!
//! The pipeline awaits a [`Submitter`] before anything is written locally.
//! There is no network: [`SimulatedSubmitter`] only waits.

use std::time::Duration;

use async_trait::async_trait;
use store::JsonObject;
use tracing::debug;

use crate::errors::SubmitError;
use crate::schema::EntityKind;

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Accept or reject `payload`. Dropping the future aborts the submission.
    async fn submit(&self, kind: EntityKind, payload: &JsonObject) -> Result<(), SubmitError>;
}

/// Accepts everything after a fixed latency.
#[derive(Debug, Clone)]
pub struct SimulatedSubmitter {
    latency: Duration,
}

impl SimulatedSubmitter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedSubmitter {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_SUBMIT_LATENCY_MS))
    }
}

#[async_trait]
impl Submitter for SimulatedSubmitter {
    async fn submit(&self, kind: EntityKind, payload: &JsonObject) -> Result<(), SubmitError> {
        debug!(
            %kind,
            fields = payload.len(),
            latency_ms = self.latency.as_millis() as u64,
            "simulating submission"
        );
        tokio::time::sleep(self.latency).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn waits_for_latency() {
        let submitter = SimulatedSubmitter::new(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        submitter
            .submit(EntityKind::Buyer, &JsonObject::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
