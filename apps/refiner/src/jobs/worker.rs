use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::jobs::orchestrator::{BulkJobOrchestrator, CancelFlag};
use crate::repository::JobSink;

/// Claims queued bulk jobs one at a time and runs them until cancelled.
pub struct Worker {
    orchestrator: Arc<BulkJobOrchestrator>,
    sink: Arc<dyn JobSink>,
    poll_interval: Duration,
    cancel: CancelFlag,
}

impl Worker {
    pub fn new(
        orchestrator: Arc<BulkJobOrchestrator>,
        sink: Arc<dyn JobSink>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            orchestrator,
            sink,
            poll_interval,
            cancel: CancelFlag::default(),
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn run(&self) {
        info!(poll_interval_secs = self.poll_interval.as_secs(), "worker started");

        while !self.cancel.is_cancelled() {
            match self.sink.claim_next_queued().await {
                Ok(Some(job)) => {
                    info!(job_id = %job.id, total = job.total, "claimed bulk job");
                    match self.orchestrator.run(job.id, &self.cancel).await {
                        Ok(job) => info!(
                            job_id = %job.id,
                            status = job.status.as_str(),
                            completed = job.completed,
                            failed = job.failed,
                            "bulk job done"
                        ),
                        Err(e) => {
                            error!(job_id = %job.id, error = %e, "bulk job failed");
                            tokio::time::sleep(self.poll_interval).await;
                        }
                    }
                }
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    error!(error = %e, "could not claim next job");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        info!("worker stopped");
    }
}
