use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::composite::{aggregate, rank, RankedDimension};
use crate::scoring::{Dimension, DimensionReport, DimensionScores, Finding, ScoringConfig};

/// One scoring of one content item. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub id: Uuid,
    pub content_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub overall: u32,
    pub scores: DimensionScores,
    pub reports: Vec<DimensionReport>,
    /// Absent when the body was too degenerate to analyze.
    pub actual_reading_ease: Option<f64>,
    pub target_reading_ease: f64,
    pub gap: Option<f64>,
    pub config_version: u32,
}

impl ScoreSnapshot {
    /// The only way a snapshot gets its overall score.
    pub fn from_reports(
        content_id: Uuid,
        reports: Vec<DimensionReport>,
        target_reading_ease: f64,
        config: &ScoringConfig,
    ) -> Self {
        let scores = DimensionScores::from_reports(&reports);
        let overall = aggregate(&scores, &config.weights);
        let (actual_reading_ease, gap) = reports
            .iter()
            .find_map(|r| match r {
                DimensionReport::Readability(r) => Some((r.actual, r.gap)),
                _ => None,
            })
            .unwrap_or((None, None));

        ScoreSnapshot {
            id: Uuid::new_v4(),
            content_id,
            created_at: Utc::now(),
            overall,
            scores,
            reports,
            actual_reading_ease,
            target_reading_ease,
            gap,
            config_version: config.version,
        }
    }

    pub fn ranked(&self) -> Vec<RankedDimension> {
        rank(&self.scores)
    }

    pub fn report(&self, dimension: Dimension) -> Option<&DimensionReport> {
        self.reports.iter().find(|r| r.dimension() == dimension)
    }

    pub fn findings_for(&self, dimension: Dimension) -> &[Finding] {
        self.report(dimension).map(|r| r.findings()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassOutcome {
    Improved,
    NoChange,
    Regressed,
    Failed,
}

impl PassOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            PassOutcome::Improved => "improved",
            PassOutcome::NoChange => "no-change",
            PassOutcome::Regressed => "regressed",
            PassOutcome::Failed => "failed",
        }
    }
}

/// Append-only record of one score → rewrite → rescore iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPass {
    pub id: Uuid,
    pub content_id: Uuid,
    pub pass_number: u32,
    pub dimensions: Vec<Dimension>,
    pub before: ScoreSnapshot,
    /// Absent when the rewrite failed.
    pub after: Option<ScoreSnapshot>,
    pub cost_usd: f64,
    pub usage: TokenUsage,
    pub outcome: PassOutcome,
    /// Whether the rewritten body was written back.
    pub applied: bool,
    pub change_ratio: Option<f64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
