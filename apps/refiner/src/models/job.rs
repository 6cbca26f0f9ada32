use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::models::snapshot::TokenUsage;
use crate::refinement::StopReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::CompletedWithErrors => "completed_with_errors",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "completed_with_errors" => Some(JobStatus::CompletedWithErrors),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed
                | JobStatus::CompletedWithErrors
                | JobStatus::Failed
                | JobStatus::Cancelled
        )
    }

    /// Final status from the item counters of a job that ran to the end.
    pub fn from_counts(completed: u32, failed: u32) -> Self {
        match (completed, failed) {
            (_, 0) => JobStatus::Completed,
            (0, _) => JobStatus::Failed,
            _ => JobStatus::CompletedWithErrors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Completed,
    Failed,
}

/// Outcome of one content item inside a bulk job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub content_id: Uuid,
    pub outcome: ItemOutcome,
    pub error: Option<String>,
    pub initial_overall: Option<u32>,
    pub final_overall: Option<u32>,
    pub passes: u32,
    /// Passes whose rewrite was kept.
    #[serde(default)]
    pub applied_passes: u32,
    pub cost_usd: f64,
    #[serde(default)]
    pub usage: TokenUsage,
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkJob {
    pub id: Uuid,
    pub content_ids: Vec<Uuid>,
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub status: JobStatus,
    pub results: Vec<ItemResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BulkJob {
    pub fn new(content_ids: Vec<Uuid>) -> Self {
        let now = Utc::now();
        BulkJob {
            id: Uuid::new_v4(),
            total: content_ids.len() as u32,
            content_ids,
            completed: 0,
            failed: 0,
            status: JobStatus::Queued,
            results: vec![],
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[cfg(test)]
    pub fn apply(&mut self, patch: &JobPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(failed) = patch.failed {
            self.failed = failed;
        }
        if let Some(result) = &patch.append_result {
            self.results.push(result.clone());
        }
        if let Some(error) = &patch.error {
            self.error = Some(error.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update of a job. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub completed: Option<u32>,
    pub failed: Option<u32>,
    pub append_result: Option<ItemResult>,
    pub error: Option<String>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        JobPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn failed_with(error: impl Into<String>) -> Self {
        JobPatch {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BulkJobRow {
    pub id: Uuid,
    pub content_ids: Vec<Uuid>,
    pub total: i32,
    pub completed: i32,
    pub failed: i32,
    pub status: String,
    pub results: Json<Vec<ItemResult>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BulkJobRow> for BulkJob {
    type Error = RepositoryError;

    fn try_from(row: BulkJobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status).ok_or_else(|| {
            RepositoryError::Corrupt(format!("job {} has unknown status '{}'", row.id, row.status))
        })?;
        Ok(BulkJob {
            id: row.id,
            content_ids: row.content_ids,
            total: row.total.max(0) as u32,
            completed: row.completed.max(0) as u32,
            failed: row.failed.max(0) as u32,
            status,
            results: row.results.0,
            error: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_status_from_counts() {
        assert_eq!(JobStatus::from_counts(5, 0), JobStatus::Completed);
        assert_eq!(JobStatus::from_counts(4, 1), JobStatus::CompletedWithErrors);
        assert_eq!(JobStatus::from_counts(0, 5), JobStatus::Failed);
        assert_eq!(JobStatus::from_counts(0, 0), JobStatus::Completed);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::CompletedWithErrors.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_strings_roundtrip() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::CompletedWithErrors,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::json!(status.as_str())
            );
        }
    }

    #[test]
    fn test_apply_patch_appends_result() {
        let id = Uuid::new_v4();
        let mut job = BulkJob::new(vec![id]);
        job.apply(&JobPatch {
            completed: Some(1),
            append_result: Some(ItemResult {
                content_id: id,
                outcome: ItemOutcome::Completed,
                error: None,
                initial_overall: Some(60),
                final_overall: Some(80),
                passes: 2,
                applied_passes: 1,
                cost_usd: 0.01,
                usage: TokenUsage::default(),
                stop_reason: Some(StopReason::ThresholdReached),
            }),
            ..Default::default()
        });
        assert_eq!(job.completed, 1);
        assert_eq!(job.results.len(), 1);
        assert_eq!(job.status, JobStatus::Queued);

        job.apply(&JobPatch::failed_with("database unreachable"));
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("database unreachable"));
    }

    #[test]
    fn test_item_result_without_usage_fields_deserializes() {
        let id = Uuid::new_v4();
        let stored = serde_json::json!({
            "content_id": id,
            "outcome": "completed",
            "error": null,
            "initial_overall": 61,
            "final_overall": 72,
            "passes": 2,
            "cost_usd": 0.02,
            "stop_reason": "max_iterations"
        });
        let result: ItemResult = serde_json::from_value(stored).unwrap();
        assert_eq!(result.applied_passes, 0);
        assert_eq!(result.usage, TokenUsage::default());
    }
}
