// Quality scoring core.
// Pure scorers per dimension, the intent gap curve, the composite aggregator,
// and the async ContentScorer that gathers reference evidence and builds snapshots.

pub mod aeo;
pub mod audience;
pub mod composite;
pub mod engagement;
pub mod factcheck;
pub mod intent_gap;
pub mod readability;
pub mod scorer;
pub mod seo;
pub mod text;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::content::{ContentItem, TargetProfile};
use crate::scoring::aeo::AeoReport;
use crate::scoring::composite::DimensionWeights;
use crate::scoring::engagement::EngagementReport;
use crate::scoring::factcheck::{EvidenceSet, FactCheckReport};
use crate::scoring::intent_gap::GapCurve;
use crate::scoring::readability::ReadabilityReport;
use crate::scoring::seo::SeoReport;
use crate::scoring::text::Document;

// ────────────────────────────────────────────────────────────────────────────
// Dimensions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Readability,
    Seo,
    Aeo,
    Engagement,
    FactCheck,
}

impl Dimension {
    /// Aggregation order. Never reorder: composite summation follows it.
    pub const ALL: [Dimension; 5] = [
        Dimension::Readability,
        Dimension::Seo,
        Dimension::Aeo,
        Dimension::Engagement,
        Dimension::FactCheck,
    ];

    /// Tie-break priority for ranking (lower = fixed first).
    /// Mismatched reading level is the most damaging defect.
    pub fn priority(self) -> u8 {
        match self {
            Dimension::Readability => 0,
            Dimension::Aeo => 1,
            Dimension::Seo => 2,
            Dimension::Engagement => 3,
            Dimension::FactCheck => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Readability => "readability",
            Dimension::Seo => "seo",
            Dimension::Aeo => "aeo",
            Dimension::Engagement => "engagement",
            Dimension::FactCheck => "fact_check",
        }
    }

    /// Human-readable name used in rewrite prompts.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Readability => "readability (reading level for the audience)",
            Dimension::Seo => "search engine optimization",
            Dimension::Aeo => "answer engine optimization",
            Dimension::Engagement => "reader engagement",
            Dimension::FactCheck => "factual verifiability",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension scores, 0–100 each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub readability: f64,
    pub seo: f64,
    pub aeo: f64,
    pub engagement: f64,
    pub factcheck: f64,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Readability => self.readability,
            Dimension::Seo => self.seo,
            Dimension::Aeo => self.aeo,
            Dimension::Engagement => self.engagement,
            Dimension::FactCheck => self.factcheck,
        }
    }

    fn set(&mut self, dimension: Dimension, score: f64) {
        match dimension {
            Dimension::Readability => self.readability = score,
            Dimension::Seo => self.seo = score,
            Dimension::Aeo => self.aeo = score,
            Dimension::Engagement => self.engagement = score,
            Dimension::FactCheck => self.factcheck = score,
        }
    }

    pub fn from_reports(reports: &[DimensionReport]) -> Self {
        let mut scores = DimensionScores {
            readability: 0.0,
            seo: 0.0,
            aeo: 0.0,
            engagement: 0.0,
            factcheck: 0.0,
        };
        for report in reports {
            scores.set(report.dimension(), report.score());
        }
        scores
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Findings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

/// A single rubric violation. Drives the targeted rewrite instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(rule_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
        }
    }
}

/// Per-dimension breakdown. One variant per dimension with a fixed field set,
/// so aggregation never reads a missing key out of free-form JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dimension", rename_all = "snake_case")]
pub enum DimensionReport {
    Readability(ReadabilityReport),
    Seo(SeoReport),
    Aeo(AeoReport),
    Engagement(EngagementReport),
    FactCheck(FactCheckReport),
}

impl DimensionReport {
    pub fn dimension(&self) -> Dimension {
        match self {
            DimensionReport::Readability(_) => Dimension::Readability,
            DimensionReport::Seo(_) => Dimension::Seo,
            DimensionReport::Aeo(_) => Dimension::Aeo,
            DimensionReport::Engagement(_) => Dimension::Engagement,
            DimensionReport::FactCheck(_) => Dimension::FactCheck,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            DimensionReport::Readability(r) => r.score,
            DimensionReport::Seo(r) => r.score,
            DimensionReport::Aeo(r) => r.score,
            DimensionReport::Engagement(r) => r.score,
            DimensionReport::FactCheck(r) => r.score,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        match self {
            DimensionReport::Readability(r) => &r.findings,
            DimensionReport::Seo(r) => &r.findings,
            DimensionReport::Aeo(r) => &r.findings,
            DimensionReport::Engagement(r) => &r.findings,
            DimensionReport::FactCheck(r) => &r.findings,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Config
// ────────────────────────────────────────────────────────────────────────────

/// Every numeric constant the composite and the gap mapper depend on.
/// Bump `version` whenever a value changes so stored snapshots stay traceable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub version: u32,
    pub weights: DimensionWeights,
    pub gap_curve: GapCurve,
    /// Upper bound on claims extracted (and looked up) per snapshot.
    pub max_claims: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: 1,
            weights: DimensionWeights::default(),
            gap_curve: GapCurve::default(),
            max_claims: 10,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate()?;
        self.gap_curve.validate()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring input
// ────────────────────────────────────────────────────────────────────────────

/// Everything the pure scorers read, parsed once per snapshot.
pub struct ScoringInput<'a> {
    pub title: &'a str,
    pub meta_description: Option<&'a str>,
    pub document: Document,
    pub plain_text: String,
    pub target_reading_ease: f64,
    pub keywords: &'a [String],
}

impl<'a> ScoringInput<'a> {
    pub fn new(item: &'a ContentItem, profile: &'a TargetProfile) -> Self {
        let document = Document::parse(&item.body);
        let plain_text = document.plain_text();
        Self {
            title: &item.title,
            meta_description: item.meta_description.as_deref(),
            document,
            plain_text,
            target_reading_ease: item.effective_target(profile),
            keywords: &profile.keywords,
        }
    }
}

/// Runs every dimension scorer, in `Dimension::ALL` order.
pub fn score_dimensions(
    input: &ScoringInput<'_>,
    evidence: Option<&EvidenceSet>,
    config: &ScoringConfig,
) -> Vec<DimensionReport> {
    vec![
        DimensionReport::Readability(readability::score_readability(input, &config.gap_curve)),
        DimensionReport::Seo(seo::score_seo(input)),
        DimensionReport::Aeo(aeo::score_aeo(input)),
        DimensionReport::Engagement(engagement::score_engagement(input)),
        DimensionReport::FactCheck(factcheck::score_factcheck(
            input,
            evidence,
            config.max_claims,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{content_item, target_profile, WELL_STRUCTURED_ARTICLE};

    #[test]
    fn test_priority_order() {
        let mut by_priority = Dimension::ALL.to_vec();
        by_priority.sort_by_key(|d| d.priority());
        assert_eq!(by_priority[0], Dimension::Readability);
        assert_eq!(by_priority[1], Dimension::Aeo);
        assert_eq!(by_priority[4], Dimension::FactCheck);
    }

    #[test]
    fn test_report_serializes_with_dimension_tag() {
        let item = content_item(WELL_STRUCTURED_ARTICLE);
        let profile = target_profile(60.0, &["cold brew"]);
        let input = ScoringInput::new(&item, &profile);
        let reports = score_dimensions(&input, None, &ScoringConfig::default());

        let json = serde_json::to_value(&reports[1]).unwrap();
        assert_eq!(json["dimension"], "seo");

        let back: DimensionReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.dimension(), Dimension::Seo);
        assert_eq!(back.score(), reports[1].score());
        assert_eq!(back.findings(), reports[1].findings());
    }

    #[test]
    fn test_report_with_missing_field_fails_to_deserialize() {
        let json = serde_json::json!({ "dimension": "aeo", "score": 50.0 });
        assert!(serde_json::from_value::<DimensionReport>(json).is_err());
    }

    #[test]
    fn test_score_dimensions_covers_all_dimensions_in_order() {
        let item = content_item(WELL_STRUCTURED_ARTICLE);
        let profile = target_profile(60.0, &[]);
        let input = ScoringInput::new(&item, &profile);
        let reports = score_dimensions(&input, None, &ScoringConfig::default());
        let dims: Vec<Dimension> = reports.iter().map(|r| r.dimension()).collect();
        assert_eq!(dims, Dimension::ALL.to_vec());
        for r in &reports {
            assert!((0.0..=100.0).contains(&r.score()), "{} out of range", r.dimension());
        }
    }

    #[test]
    fn test_item_override_wins_over_strategy_target() {
        let mut item = content_item(WELL_STRUCTURED_ARTICLE);
        let profile = target_profile(60.0, &[]);
        assert_eq!(ScoringInput::new(&item, &profile).target_reading_ease, 60.0);
        item.target_reading_ease = Some(45.0);
        assert_eq!(ScoringInput::new(&item, &profile).target_reading_ease, 45.0);
    }

    #[test]
    fn test_default_config_is_valid_version_one() {
        let config = ScoringConfig::default();
        assert_eq!(config.version, 1);
        assert!(config.validate().is_ok());
    }
}
