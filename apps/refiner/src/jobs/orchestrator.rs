//! Bulk Job Orchestrator: runs the refinement loop over a list of content ids,
//! one item at a time, isolating per-item failures.
//!
//! Progress (counters plus the item's result) is persisted after every item so
//! a cancelled or aborted job keeps everything recorded so far. A job stopped
//! by worker shutdown goes back to `queued` and resumes after its last result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{BulkJob, ItemOutcome, ItemResult, JobPatch, JobStatus};
use crate::models::snapshot::TokenUsage;
use crate::refinement::ImprovementPassController;
use crate::repository::JobSink;

/// In-process cancellation, set on worker shutdown. Checked between items.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum Interruption {
    /// The job was cancelled through the sink.
    Cancelled,
    /// The worker is shutting down.
    Shutdown,
}

pub struct BulkJobOrchestrator {
    controller: Arc<ImprovementPassController>,
    sink: Arc<dyn JobSink>,
    inter_item_delay: Duration,
}

impl BulkJobOrchestrator {
    pub fn new(
        controller: Arc<ImprovementPassController>,
        sink: Arc<dyn JobSink>,
        inter_item_delay: Duration,
    ) -> Self {
        Self {
            controller,
            sink,
            inter_item_delay,
        }
    }

    /// Creates a queued job for `content_ids`.
    pub async fn submit(&self, content_ids: &[Uuid]) -> Result<Uuid, AppError> {
        let job_id = self.sink.create_job(content_ids).await?;
        info!(job_id = %job_id, total = content_ids.len(), "bulk job queued");
        Ok(job_id)
    }

    /// Runs `job_id` to a terminal status and returns the final job.
    ///
    /// Returns `Err` only for fatal errors; the job is then marked `failed` on a
    /// best-effort basis.
    pub async fn run(&self, job_id: Uuid, cancel: &CancelFlag) -> Result<BulkJob, AppError> {
        let job = self.sink.get_job(job_id).await?;
        if job.status.is_terminal() {
            info!(job_id = %job_id, status = job.status.as_str(), "job already finished");
            return Ok(job);
        }

        match self.process(job, cancel).await {
            Ok(job) => Ok(job),
            Err(e) => {
                error!(job_id = %job_id, error = %e, "bulk job aborted");
                if let Err(update_err) = self
                    .sink
                    .update_job(job_id, JobPatch::failed_with(e.to_string()))
                    .await
                {
                    warn!(
                        job_id = %job_id,
                        error = %update_err,
                        "could not mark aborted job as failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn process(&self, job: BulkJob, cancel: &CancelFlag) -> Result<BulkJob, AppError> {
        if job.status != JobStatus::Processing {
            self.sink
                .update_job(job.id, JobPatch::status(JobStatus::Processing))
                .await?;
        }

        // Items already recorded by an earlier run of this job are skipped.
        let start = job.results.len();
        if start > 0 {
            info!(job_id = %job.id, skipped = start, total = job.total, "bulk job resumed");
        } else {
            info!(job_id = %job.id, total = job.total, "bulk job started");
        }

        let mut completed = job.completed;
        let mut failed = job.failed;

        for (index, &content_id) in job.content_ids.iter().enumerate().skip(start) {
            if index > start {
                tokio::time::sleep(self.inter_item_delay).await;
            }

            match self.interruption(job.id, cancel).await? {
                Some(Interruption::Cancelled) => {
                    info!(job_id = %job.id, processed = index, "bulk job cancelled");
                    return Ok(self.sink.get_job(job.id).await?);
                }
                Some(Interruption::Shutdown) => {
                    info!(job_id = %job.id, processed = index, "bulk job requeued on shutdown");
                    self.sink
                        .update_job(job.id, JobPatch::status(JobStatus::Queued))
                        .await?;
                    return Ok(self.sink.get_job(job.id).await?);
                }
                None => {}
            }

            let result = match self.controller.refine(content_id).await {
                Ok(outcome) => {
                    completed += 1;
                    ItemResult {
                        content_id: outcome.content_id,
                        outcome: ItemOutcome::Completed,
                        error: None,
                        initial_overall: Some(outcome.initial.overall),
                        final_overall: Some(outcome.final_snapshot.overall),
                        passes: outcome.iterations,
                        applied_passes: outcome.passes.iter().filter(|p| p.applied).count() as u32,
                        cost_usd: outcome.cumulative_cost_usd,
                        usage: outcome.usage,
                        stop_reason: Some(outcome.stop_reason),
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    failed += 1;
                    warn!(job_id = %job.id, content_id = %content_id, error = %e, "item failed");
                    ItemResult {
                        content_id,
                        outcome: ItemOutcome::Failed,
                        error: Some(e.to_string()),
                        initial_overall: None,
                        final_overall: None,
                        passes: 0,
                        applied_passes: 0,
                        cost_usd: 0.0,
                        usage: TokenUsage::default(),
                        stop_reason: None,
                    }
                }
            };

            self.sink
                .update_job(
                    job.id,
                    JobPatch {
                        completed: Some(completed),
                        failed: Some(failed),
                        append_result: Some(result),
                        ..Default::default()
                    },
                )
                .await?;

            info!(
                job_id = %job.id,
                content_id = %content_id,
                completed,
                failed,
                total = job.total,
                "item processed"
            );
        }

        // A cancel that landed during the last item wins over the final status.
        let current = self.sink.get_job(job.id).await?;
        if current.status == JobStatus::Cancelled {
            info!(job_id = %job.id, completed, failed, "bulk job cancelled after its last item");
            return Ok(current);
        }

        let status = JobStatus::from_counts(completed, failed);
        self.sink.update_job(job.id, JobPatch::status(status)).await?;
        info!(job_id = %job.id, status = status.as_str(), completed, failed, "bulk job finished");

        Ok(self.sink.get_job(job.id).await?)
    }

    /// Sink cancellation is checked first so a shutdown never revives a
    /// cancelled job.
    async fn interruption(
        &self,
        job_id: Uuid,
        cancel: &CancelFlag,
    ) -> Result<Option<Interruption>, AppError> {
        let job = self.sink.get_job(job_id).await?;
        if job.status == JobStatus::Cancelled {
            return Ok(Some(Interruption::Cancelled));
        }
        if cancel.is_cancelled() {
            return Ok(Some(Interruption::Shutdown));
        }
        Ok(None)
    }
}
