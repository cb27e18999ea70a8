use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::client::{AnalysisError, AnalysisJobClient};
use super::domain::{AnalysisJob, JobId};
use crate::config::AnalysisConfig;

const MIN_ATTEMPTS: u32 = 1;

/// Shared flag letting a caller abandon a poll loop between attempts.
#[derive(Debug, Clone, Default)]
pub struct PollCancellation {
    cancelled: Arc<AtomicBool>,
}

impl PollCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("job {job_id} still in progress after {attempts} attempt(s)")]
    Timeout { job_id: JobId, attempts: u32 },
    #[error("polling for job {job_id} cancelled after {attempts} attempt(s)")]
    Cancelled { job_id: JobId, attempts: u32 },
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Fixed-interval poller with a hard attempt cap.
#[derive(Debug, Clone)]
pub struct JobPoller {
    interval: Duration,
    max_attempts: u32,
}

impl JobPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(MIN_ATTEMPTS),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.poll_interval, config.max_attempts)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn wait_for_completion<C>(
        &self,
        client: &C,
        job_id: &JobId,
    ) -> Result<AnalysisJob, PollError>
    where
        C: AnalysisJobClient + ?Sized,
    {
        self.wait_cancellable(client, job_id, &PollCancellation::default())
            .await
    }

    /// Query until the job is terminal, sleeping `interval` between queries.
    ///
    /// A failed job is returned as-is. Transient query failures are logged and
    /// use up an attempt; running out of attempts is always a timeout.
    pub async fn wait_cancellable<C>(
        &self,
        client: &C,
        job_id: &JobId,
        cancellation: &PollCancellation,
    ) -> Result<AnalysisJob, PollError>
    where
        C: AnalysisJobClient + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            if cancellation.is_cancelled() {
                return Err(PollError::Cancelled {
                    job_id: job_id.clone(),
                    attempts: attempt - 1,
                });
            }

            match client.poll(job_id).await {
                Ok(job) if job.status.is_terminal() => {
                    info!(%job_id, status = job.status.label(), attempt, "analysis job finished");
                    return Ok(job);
                }
                Ok(_) => {
                    debug!(%job_id, attempt, "analysis job still in progress");
                }
                Err(err) if err.is_retryable() => {
                    warn!(%job_id, attempt, error = %err, "transient failure while polling");
                }
                Err(err) => return Err(err.into()),
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(PollError::Timeout {
            job_id: job_id.clone(),
            attempts: self.max_attempts,
        })
    }
}
