use std::time::Duration;

use thiserror::Error;

/// Application-level error type.
///
/// Everything the controller and orchestrator can fail with funnels into this
/// enum. `is_fatal` separates connectivity failures (which abort a bulk job)
/// from failures that stay local to one content item.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when no progress can be durably recorded anymore.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Repository(RepositoryError::Unavailable(_)))
    }
}

/// Errors raised by the content repository and job-status sink collaborators.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepositoryError::Unavailable(err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                RepositoryError::Corrupt(err.to_string())
            }
            other => RepositoryError::Query(other.to_string()),
        }
    }
}

/// Failure of a single call to the generative text service.
///
/// Always recorded as a `failed` improvement pass; never aborts a refinement run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation returned empty output")]
    Empty,

    #[error("generation returned malformed output: {0}")]
    Malformed(String),

    #[error("generation service error: {0}")]
    Service(String),
}

/// The text is too short or degenerate to score.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("insufficient content: {0}")]
pub struct InsufficientContent(pub String);
