use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::errors::GenerationError;
use crate::llm_client::prompts::PRESERVE_INSTRUCTION;
use crate::llm_client::strip_json_fences;
use crate::models::content::{ContentItem, TargetProfile};
use crate::models::snapshot::ScoreSnapshot;
use crate::refinement::prompts::{dimension_guidance, REWRITE_PROMPT_TEMPLATE};
use crate::scoring::text::normalized_words;
use crate::scoring::{Dimension, Finding};

#[derive(Debug, Deserialize)]
struct RewritePayload {
    body: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRewrite {
    pub body: String,
    pub notes: Option<String>,
}

/// Builds a rewrite prompt scoped to the findings of `dimensions` only.
pub fn build_rewrite_prompt(
    item: &ContentItem,
    profile: &TargetProfile,
    snapshot: &ScoreSnapshot,
    dimensions: &[Dimension],
) -> String {
    let mut findings: Vec<(Dimension, &Finding)> = dimensions
        .iter()
        .flat_map(|d| snapshot.findings_for(*d).iter().map(move |f| (*d, f)))
        .collect();
    findings.sort_by_key(|(_, f)| f.severity);

    let findings_text = if findings.is_empty() {
        "- No specific issues recorded; improve the dimension generally".to_string()
    } else {
        findings
            .iter()
            .map(|(d, f)| format!("- [{d}] [{:?}] {}", f.severity, f.message))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let guidance = dimensions
        .iter()
        .map(|d| dimension_guidance(*d))
        .collect::<Vec<_>>()
        .join("\n");

    let labels = dimensions
        .iter()
        .map(|d| d.label())
        .collect::<Vec<_>>()
        .join(" and ");

    let keywords = if profile.keywords.is_empty() {
        "none specified".to_string()
    } else {
        profile.keywords.join(", ")
    };

    let actual = snapshot
        .actual_reading_ease
        .map(|a| format!("{a:.1}"))
        .unwrap_or_else(|| "unknown".to_string());

    let target = format!("{:.0}", snapshot.target_reading_ease);
    // One pass over the template, so field values are never expanded again.
    placeholder_re()
        .replace_all(REWRITE_PROMPT_TEMPLATE, |caps: &Captures<'_>| {
            let value = match &caps[1] {
                "dimensions" => labels.as_str(),
                "title" => item.title.as_str(),
                "audience" => non_empty(&profile.audience, "general readers"),
                "target_reading_ease" => target.as_str(),
                "actual_reading_ease" => actual.as_str(),
                "tone" => profile.tone.as_deref().unwrap_or("unchanged"),
                "keywords" => keywords.as_str(),
                "findings" => findings_text.as_str(),
                "guidance" => guidance.as_str(),
                "preserve" => PRESERVE_INSTRUCTION,
                "body" => item.body.as_str(),
                _ => caps.get(0).map_or("", |m| m.as_str()),
            };
            value.to_string()
        })
        .into_owned()
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex"))
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Extracts the rewritten body from a model response.
///
/// JSON objects use `body`. Anything that does not parse as JSON is taken as
/// the markdown body itself, unless it opens like a broken JSON object.
pub fn parse_rewrite(text: &str) -> Result<ParsedRewrite, GenerationError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(GenerationError::Empty);
    }

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => {
            let payload: RewritePayload = serde_json::from_value(value)
                .map_err(|e| GenerationError::Malformed(e.to_string()))?;
            if payload.body.trim().is_empty() {
                return Err(GenerationError::Empty);
            }
            Ok(ParsedRewrite {
                body: payload.body.trim().to_string(),
                notes: payload.notes,
            })
        }
        Err(e) if text.starts_with('{') => Err(GenerationError::Malformed(e.to_string())),
        Err(_) => Ok(ParsedRewrite {
            body: text.to_string(),
            notes: None,
        }),
    }
}

/// Word-set distance between two bodies: 0.0 identical vocabulary, 1.0 disjoint.
pub fn change_ratio(before: &str, after: &str) -> f64 {
    let a: HashSet<String> = normalized_words(before).into_iter().collect();
    let b: HashSet<String> = normalized_words(after).into_iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    1.0 - a.intersection(&b).count() as f64 / union as f64
}
