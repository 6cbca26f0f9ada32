use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::scoring::audience::target_for_audience;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Approved,
    Published,
}

impl ContentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Approved => "approved",
            ContentStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ContentStatus::Draft),
            "approved" => Some(ContentStatus::Approved),
            "published" => Some(ContentStatus::Published),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    /// Markdown.
    pub body: String,
    pub word_count: u32,
    pub strategy_id: Uuid,
    pub status: ContentStatus,
    pub meta_description: Option<String>,
    /// Overrides the strategy's target when set.
    pub target_reading_ease: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn effective_target(&self, profile: &TargetProfile) -> f64 {
        self.target_reading_ease
            .unwrap_or(profile.target_reading_ease)
    }
}

/// Per-strategy targets every content item of the strategy is scored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub strategy_id: Uuid,
    pub target_reading_ease: f64,
    pub keywords: Vec<String>,
    pub tone: Option<String>,
    pub audience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentItemRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub word_count: i32,
    pub strategy_id: Uuid,
    pub status: String,
    pub meta_description: Option<String>,
    pub target_reading_ease: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ContentItemRow> for ContentItem {
    type Error = RepositoryError;

    fn try_from(row: ContentItemRow) -> Result<Self, Self::Error> {
        let status = ContentStatus::parse(&row.status).ok_or_else(|| {
            RepositoryError::Corrupt(format!(
                "content item {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(ContentItem {
            id: row.id,
            title: row.title,
            body: row.body,
            word_count: row.word_count.max(0) as u32,
            strategy_id: row.strategy_id,
            status,
            meta_description: row.meta_description,
            target_reading_ease: row.target_reading_ease,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TargetProfileRow {
    pub strategy_id: Uuid,
    pub target_reading_ease: Option<f64>,
    pub keywords: Vec<String>,
    pub tone: Option<String>,
    pub audience: Option<String>,
}

impl From<TargetProfileRow> for TargetProfile {
    fn from(row: TargetProfileRow) -> Self {
        let audience = row.audience.unwrap_or_default();
        TargetProfile {
            strategy_id: row.strategy_id,
            target_reading_ease: row
                .target_reading_ease
                .unwrap_or_else(|| target_for_audience(&audience)),
            keywords: row.keywords,
            tone: row.tone,
            audience,
        }
    }
}
