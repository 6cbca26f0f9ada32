//! Fact-verifiability: how many factual claims are corroborated by external
//! reference snippets.
//!
//! Claims are extracted from the prose here; looking them up is the
//! `ContentScorer`'s job, which hands the results in as an `EvidenceSet`.

use std::collections::{HashMap, HashSet};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::evidence::ReferenceSnippet;
use crate::scoring::text::split_sentences;
use crate::scoring::{Finding, ScoringInput, Severity};

const ATTRIBUTION_MARKERS: &[&str] = &[
    "according to",
    "study",
    "research",
    "survey",
    "report",
    "found that",
    "percent",
];
const CURRENCY_SIGNS: &[char] = &['$', '€', '£', '¥'];
const NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Two or more snippets from distinct hosts.
    Verified,
    /// Exactly one corroborating source.
    Uncertain,
    Unverified,
    /// Lookup failed; excluded from the score.
    Unchecked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCheck {
    pub claim: String,
    pub status: ClaimStatus,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckReport {
    pub score: f64,
    /// True when no evidence was available and the neutral score was used.
    pub skipped: bool,
    pub claims: Vec<ClaimCheck>,
    pub verified: usize,
    pub uncertain: usize,
    pub unverified: usize,
    pub findings: Vec<Finding>,
    pub strengths: Vec<String>,
}

/// Reference lookups for one run, keyed by claim text. `None` marks a failed lookup.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSet {
    results: HashMap<String, Option<Vec<ReferenceSnippet>>>,
}

impl EvidenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, claim: &str, snippets: Vec<ReferenceSnippet>) {
        self.results.insert(claim.to_string(), Some(snippets));
    }

    pub fn record_failure(&mut self, claim: &str) {
        self.results.insert(claim.to_string(), None);
    }

    pub fn contains(&self, claim: &str) -> bool {
        self.results.contains_key(claim)
    }

    /// `None` when the claim was never looked up or the lookup failed.
    pub fn get(&self, claim: &str) -> Option<&[ReferenceSnippet]> {
        self.results.get(claim).and_then(|r| r.as_deref())
    }
}

fn is_claim(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    sentence
        .chars()
        .any(|c| c.is_ascii_digit() || c == '%' || CURRENCY_SIGNS.contains(&c))
        || ATTRIBUTION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Sentences that state something checkable, in document order, deduplicated.
pub fn extract_claims(plain_text: &str, max_claims: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    split_sentences(plain_text)
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| is_claim(s))
        .filter(|s| seen.insert(s.clone()))
        .take(max_claims)
        .collect()
}

fn source_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()))
        .unwrap_or_else(|| url.to_lowercase())
}

/// Classifies one claim by its supporting snippets.
pub fn classify(snippets: &[ReferenceSnippet]) -> ClaimStatus {
    let hosts: HashSet<String> = snippets.iter().map(|s| source_host(&s.url)).collect();
    match (snippets.len(), hosts.len()) {
        (0, _) => ClaimStatus::Unverified,
        (_, h) if h >= 2 => ClaimStatus::Verified,
        _ => ClaimStatus::Uncertain,
    }
}

pub fn score_factcheck(
    input: &ScoringInput<'_>,
    evidence: Option<&EvidenceSet>,
    max_claims: usize,
) -> FactCheckReport {
    let claims = extract_claims(&input.plain_text, max_claims);

    if claims.is_empty() {
        return FactCheckReport {
            score: 100.0,
            skipped: false,
            claims: vec![],
            verified: 0,
            uncertain: 0,
            unverified: 0,
            findings: vec![],
            strengths: vec!["No factual claims that need verification".to_string()],
        };
    }

    let Some(evidence) = evidence else {
        return FactCheckReport {
            score: NEUTRAL_SCORE,
            skipped: true,
            claims: claims
                .into_iter()
                .map(|claim| ClaimCheck {
                    claim,
                    status: ClaimStatus::Unchecked,
                    sources: vec![],
                })
                .collect(),
            verified: 0,
            uncertain: 0,
            unverified: 0,
            findings: vec![Finding::new(
                "factcheck.no_evidence",
                Severity::Info,
                "No reference provider configured; claims were not checked",
            )],
            strengths: vec![],
        };
    };

    let checks: Vec<ClaimCheck> = claims
        .into_iter()
        .map(|claim| {
            let (status, sources) = match evidence.get(&claim) {
                Some(snippets) => (
                    classify(snippets),
                    snippets.iter().map(|s| s.url.clone()).collect(),
                ),
                None => (ClaimStatus::Unchecked, vec![]),
            };
            ClaimCheck {
                claim,
                status,
                sources,
            }
        })
        .collect();

    let count = |status: ClaimStatus| checks.iter().filter(|c| c.status == status).count();
    let verified = count(ClaimStatus::Verified);
    let uncertain = count(ClaimStatus::Uncertain);
    let unverified = count(ClaimStatus::Unverified);
    let checked = verified + uncertain + unverified;

    let mut findings = Vec::new();
    let mut strengths = Vec::new();

    if checked == 0 {
        findings.push(Finding::new(
            "factcheck.lookups_failed",
            Severity::Info,
            "Every reference lookup failed; claims were not checked",
        ));
        return FactCheckReport {
            score: NEUTRAL_SCORE,
            skipped: true,
            claims: checks,
            verified,
            uncertain,
            unverified,
            findings,
            strengths,
        };
    }

    for check in &checks {
        match check.status {
            ClaimStatus::Unverified => findings.push(Finding::new(
                "factcheck.unverified_claim",
                Severity::High,
                format!(
                    "No source corroborates: \"{}\". Cite a source or soften the claim",
                    check.claim
                ),
            )),
            ClaimStatus::Uncertain => findings.push(Finding::new(
                "factcheck.single_source_claim",
                Severity::Medium,
                format!(
                    "Only one source supports: \"{}\". Add attribution",
                    check.claim
                ),
            )),
            ClaimStatus::Verified | ClaimStatus::Unchecked => {}
        }
    }
    if verified > 0 {
        strengths.push(format!("{verified} of {checked} claims independently verified"));
    }

    FactCheckReport {
        score: (verified as f64 + 0.5 * uncertain as f64) / checked as f64 * 100.0,
        skipped: false,
        claims: checks,
        verified,
        uncertain,
        unverified,
        findings,
        strengths,
    }
}
