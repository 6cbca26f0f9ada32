use std::time::Duration;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::models::content::{ContentItem, ContentItemRow, TargetProfile, TargetProfileRow};
use crate::models::job::{BulkJob, BulkJobRow, JobPatch, JobStatus};
use crate::models::snapshot::{ImprovementPass, ScoreSnapshot};
use crate::repository::{ContentRepository, JobSink};

/// Content items, strategy targets, snapshots and passes in PostgreSQL.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn get(&self, id: Uuid) -> Result<ContentItem, RepositoryError> {
        let row = sqlx::query_as::<_, ContentItemRow>(
            r#"
            SELECT id, title, body, word_count, strategy_id, status,
                   meta_description, target_reading_ease, updated_at
            FROM content_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "content item",
            id: id.to_string(),
        })?;

        ContentItem::try_from(row)
    }

    async fn target_profile(&self, strategy_id: Uuid) -> Result<TargetProfile, RepositoryError> {
        let row = sqlx::query_as::<_, TargetProfileRow>(
            r#"
            SELECT strategy_id, target_reading_ease, keywords, tone, audience
            FROM target_profiles
            WHERE strategy_id = $1
            "#,
        )
        .bind(strategy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "target profile",
            id: strategy_id.to_string(),
        })?;

        Ok(TargetProfile::from(row))
    }

    async fn put(&self, id: Uuid, body: &str, word_count: u32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE content_items SET body = $2, word_count = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(body)
        .bind(word_count as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "content item",
                id: id.to_string(),
            });
        }
        debug!(content_id = %id, word_count, "content body replaced");
        Ok(())
    }

    async fn append_score_snapshot(
        &self,
        id: Uuid,
        snapshot: &ScoreSnapshot,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO score_snapshots
                (id, content_id, overall, scores, reports, actual_reading_ease,
                 target_reading_ease, gap, config_version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(snapshot.id)
        .bind(id)
        .bind(snapshot.overall as i32)
        .bind(Json(&snapshot.scores))
        .bind(Json(&snapshot.reports))
        .bind(snapshot.actual_reading_ease)
        .bind(snapshot.target_reading_ease)
        .bind(snapshot.gap)
        .bind(snapshot.config_version as i32)
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_improvement_pass(
        &self,
        id: Uuid,
        pass: &ImprovementPass,
    ) -> Result<(), RepositoryError> {
        let dimensions: Vec<&str> = pass.dimensions.iter().map(|d| d.as_str()).collect();
        sqlx::query(
            r#"
            INSERT INTO improvement_passes
                (id, content_id, pass_number, dimensions, before_snapshot_id, after_snapshot_id,
                 before_overall, after_overall, cost_usd, input_tokens, output_tokens,
                 outcome, applied, change_ratio, error_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(pass.id)
        .bind(id)
        .bind(pass.pass_number as i32)
        .bind(&dimensions)
        .bind(pass.before.id)
        .bind(pass.after.as_ref().map(|s| s.id))
        .bind(pass.before.overall as i32)
        .bind(pass.after.as_ref().map(|s| s.overall as i32))
        .bind(pass.cost_usd)
        .bind(pass.usage.input_tokens as i32)
        .bind(pass.usage.output_tokens as i32)
        .bind(pass.outcome.as_str())
        .bind(pass.applied)
        .bind(pass.change_ratio)
        .bind(&pass.error)
        .bind(pass.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Bulk job progress in PostgreSQL.
#[derive(Clone)]
pub struct PgJobSink {
    pool: PgPool,
    /// Must exceed the longest single-item refinement.
    stale_after: Duration,
}

impl PgJobSink {
    pub fn new(pool: PgPool, stale_after: Duration) -> Self {
        Self { pool, stale_after }
    }
}

#[async_trait]
impl JobSink for PgJobSink {
    async fn create_job(&self, content_ids: &[Uuid]) -> Result<Uuid, RepositoryError> {
        let job = BulkJob::new(content_ids.to_vec());
        sqlx::query(
            r#"
            INSERT INTO bulk_jobs (id, content_ids, total, completed, failed, status, results)
            VALUES ($1, $2, $3, 0, 0, $4, '[]'::jsonb)
            "#,
        )
        .bind(job.id)
        .bind(&job.content_ids)
        .bind(job.total as i32)
        .bind(JobStatus::Queued.as_str())
        .execute(&self.pool)
        .await?;
        Ok(job.id)
    }

    async fn update_job(&self, job_id: Uuid, patch: JobPatch) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE bulk_jobs SET
                status = COALESCE($2, status),
                completed = COALESCE($3, completed),
                failed = COALESCE($4, failed),
                results = CASE
                    WHEN $5::jsonb IS NULL THEN results
                    ELSE results || jsonb_build_array($5::jsonb)
                END,
                error_message = COALESCE($6, error_message),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.completed.map(|c| c as i32))
        .bind(patch.failed.map(|f| f as i32))
        .bind(patch.append_result.as_ref().map(Json))
        .bind(&patch.error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "job",
                id: job_id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<BulkJob, RepositoryError> {
        let row = sqlx::query_as::<_, BulkJobRow>("SELECT * FROM bulk_jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "job",
                id: job_id.to_string(),
            })?;
        BulkJob::try_from(row)
    }

    async fn claim_next_queued(&self) -> Result<Option<BulkJob>, RepositoryError> {
        let row = sqlx::query_as::<_, BulkJobRow>(
            r#"
            UPDATE bulk_jobs SET status = 'processing', updated_at = now()
            WHERE id = (
                SELECT id FROM bulk_jobs
                WHERE status = 'queued'
                   OR (status = 'processing'
                       AND updated_at < now() - make_interval(secs => $1))
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(self.stale_after.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(BulkJob::try_from).transpose()
    }
}
