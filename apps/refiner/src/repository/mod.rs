// Persistence seams: the content repository and the job-status sink.
// The core never touches a database directly, only these traits.

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::models::content::{ContentItem, TargetProfile};
use crate::models::job::{BulkJob, JobPatch};
use crate::models::snapshot::{ImprovementPass, ScoreSnapshot};

pub use postgres::{PgContentRepository, PgJobSink};

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<ContentItem, RepositoryError>;

    async fn target_profile(&self, strategy_id: Uuid) -> Result<TargetProfile, RepositoryError>;

    /// Replaces the whole body in one write.
    async fn put(&self, id: Uuid, body: &str, word_count: u32) -> Result<(), RepositoryError>;

    async fn append_score_snapshot(
        &self,
        id: Uuid,
        snapshot: &ScoreSnapshot,
    ) -> Result<(), RepositoryError>;

    async fn append_improvement_pass(
        &self,
        id: Uuid,
        pass: &ImprovementPass,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait JobSink: Send + Sync {
    async fn create_job(&self, content_ids: &[Uuid]) -> Result<Uuid, RepositoryError>;

    async fn update_job(&self, job_id: Uuid, patch: JobPatch) -> Result<(), RepositoryError>;

    async fn get_job(&self, job_id: Uuid) -> Result<BulkJob, RepositoryError>;

    /// Atomically moves the oldest claimable job to `processing` and returns it.
    /// Claimable means `queued`, or `processing` with no progress written for
    /// longer than the sink's stale threshold (its worker died).
    async fn claim_next_queued(&self) -> Result<Option<BulkJob>, RepositoryError>;
}
