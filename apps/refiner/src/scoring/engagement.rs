//! Engagement dimension: hook, calls to action, question density, paragraph
//! rhythm and direct reader address.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scoring::text::{normalized_words, split_sentences, words};
use crate::scoring::{Finding, ScoringInput, Severity};

const HOOK_PHRASES: &[&str] = &["imagine", "what if", "did you know", "picture"];
const CTA_PHRASES: &[&str] = &[
    "sign up",
    "subscribe",
    "contact us",
    "get started",
    "learn more",
    "try it",
    "download",
    "book a",
    "schedule a",
    "call us",
    "join",
    "start your",
    "request a",
];
const MAX_PARAGRAPH_WORDS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementReport {
    pub score: f64,
    pub hook: bool,
    pub cta_count: usize,
    pub question_ratio: f64,
    /// Coefficient of variation of paragraph lengths; absent under 3 paragraphs.
    pub paragraph_cv: Option<f64>,
    pub long_paragraphs: usize,
    pub second_person_per_100: f64,
    pub findings: Vec<Finding>,
    pub strengths: Vec<String>,
}

fn has_hook(first_sentence: &str) -> bool {
    let lower = first_sentence.trim().to_lowercase();
    lower.ends_with('?')
        || lower.chars().any(|c| c.is_ascii_digit())
        || HOOK_PHRASES.iter().any(|p| lower.starts_with(p))
}

fn cta_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = CTA_PHRASES
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"\b(?:{alternation})\b")).expect("cta regex")
    })
}

/// Byte offsets of every whole-word CTA phrase in lowercased text.
fn cta_positions(lower: &str) -> Vec<usize> {
    cta_re().find_iter(lower).map(|m| m.start()).collect()
}

fn coefficient_of_variation(values: &[usize]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<usize>() as f64 / n;
    if mean == 0.0 {
        return None;
    }
    let variance = values
        .iter()
        .map(|v| (*v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    Some(variance.sqrt() / mean)
}

pub fn score_engagement(input: &ScoringInput<'_>) -> EngagementReport {
    let text = &input.plain_text;
    let lower = text.to_lowercase();
    let sentences = split_sentences(text);
    let mut findings = Vec::new();
    let mut strengths = Vec::new();
    let mut score = 0.0;

    // Hook (20). The opening sentence is the first paragraph's, not a heading's.
    let opening = input
        .document
        .paragraphs()
        .next()
        .and_then(|p| split_sentences(p).into_iter().next());
    let hook = opening.as_deref().is_some_and(has_hook);
    if hook {
        score += 20.0;
        strengths.push("Opens with a hook".to_string());
    } else {
        findings.push(Finding::new(
            "engagement.weak_hook",
            Severity::Medium,
            "Open with a question, a striking number or an \"imagine\" scenario",
        ));
    }

    // Calls to action (20)
    let ctas = cta_positions(&lower);
    let cta_count = ctas.len();
    if cta_count == 0 {
        findings.push(Finding::new(
            "engagement.no_cta",
            Severity::High,
            "Add a clear call to action telling the reader what to do next",
        ));
    } else {
        score += 15.0;
        let closing_start = lower.len() * 4 / 5;
        if ctas.iter().any(|&pos| pos >= closing_start) {
            score += 5.0;
            strengths.push("Closes with a call to action".to_string());
        } else {
            findings.push(Finding::new(
                "engagement.cta_not_at_end",
                Severity::Low,
                "Repeat the call to action near the end of the piece",
            ));
        }
    }

    // Question density (15)
    let questions = sentences.iter().filter(|s| s.trim_end().ends_with('?')).count();
    let question_ratio = if sentences.is_empty() {
        0.0
    } else {
        questions as f64 / sentences.len() as f64
    };
    if (0.03..=0.15).contains(&question_ratio) {
        score += 15.0;
    } else if question_ratio > 0.0 {
        score += 8.0;
        findings.push(Finding::new(
            "engagement.question_density",
            Severity::Low,
            format!(
                "{:.0}% of sentences are questions; 3–15% keeps readers engaged",
                question_ratio * 100.0
            ),
        ));
    } else {
        findings.push(Finding::new(
            "engagement.no_questions",
            Severity::Low,
            "Ask the reader an occasional question",
        ));
    }

    // Paragraph rhythm (20) and length cap (15)
    let lengths: Vec<usize> = input
        .document
        .paragraphs()
        .map(|p| words(p).count())
        .collect();
    let paragraph_cv = coefficient_of_variation(&lengths);
    match paragraph_cv {
        Some(cv) if (0.3..=1.0).contains(&cv) => {
            score += 20.0;
            strengths.push("Varied paragraph rhythm".to_string());
        }
        Some(cv) if cv < 0.3 => {
            score += 10.0;
            findings.push(Finding::new(
                "engagement.monotonous_paragraphs",
                Severity::Low,
                "Paragraphs are all about the same length; vary them",
            ));
        }
        Some(_) => {
            score += 12.0;
            findings.push(Finding::new(
                "engagement.erratic_paragraphs",
                Severity::Low,
                "Paragraph lengths swing wildly; even them out",
            ));
        }
        None => {
            score += 5.0;
            findings.push(Finding::new(
                "engagement.few_paragraphs",
                Severity::Medium,
                "Break the text into at least three paragraphs",
            ));
        }
    }

    let long_paragraphs = lengths.iter().filter(|&&l| l > MAX_PARAGRAPH_WORDS).count();
    if !lengths.is_empty() {
        let within = lengths.len() - long_paragraphs;
        score += within as f64 / lengths.len() as f64 * 15.0;
    }
    if long_paragraphs > 0 {
        findings.push(Finding::new(
            "engagement.long_paragraphs",
            Severity::Medium,
            format!("{long_paragraphs} paragraphs exceed {MAX_PARAGRAPH_WORDS} words; split them"),
        ));
    }

    // Reader address (10)
    let tokens = normalized_words(text);
    let second_person = tokens
        .iter()
        .filter(|w| matches!(w.as_str(), "you" | "your" | "you're" | "yours"))
        .count();
    let second_person_per_100 = if tokens.is_empty() {
        0.0
    } else {
        second_person as f64 / tokens.len() as f64 * 100.0
    };
    if second_person_per_100 >= 0.5 {
        score += 10.0;
    } else if second_person > 0 {
        score += 5.0;
    } else {
        findings.push(Finding::new(
            "engagement.no_reader_address",
            Severity::Low,
            "Speak to the reader directly (\"you\", \"your\")",
        ));
    }

    EngagementReport {
        score: score.clamp(0.0, 100.0),
        hook,
        cta_count,
        question_ratio,
        paragraph_cv,
        long_paragraphs,
        second_person_per_100,
        findings,
        strengths,
    }
}
