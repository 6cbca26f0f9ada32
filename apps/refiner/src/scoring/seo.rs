//! SEO dimension. A 100-point checklist over keyword coverage, heading structure,
//! meta description, title and length.

use serde::{Deserialize, Serialize};

use crate::scoring::text::normalized_words;
use crate::scoring::{Finding, ScoringInput, Severity};

const KEYWORD_POINTS: f64 = 40.0;
const DENSITY_MIN: f64 = 0.5;
const DENSITY_MAX: f64 = 2.5;
const DENSITY_STUFFED: f64 = 3.0;
const WORDS_PER_SUBHEADING: usize = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordUsage {
    pub keyword: String,
    pub occurrences: usize,
    /// Percentage of body words covered by the keyword.
    pub density: f64,
    pub in_title_or_heading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoReport {
    pub score: f64,
    pub keywords: Vec<KeywordUsage>,
    pub heading_count: usize,
    pub meta_description_len: Option<usize>,
    pub title_len: usize,
    pub word_count: usize,
    pub findings: Vec<Finding>,
    pub strengths: Vec<String>,
}

pub fn score_seo(input: &ScoringInput<'_>) -> SeoReport {
    let body_words = normalized_words(&input.plain_text);
    let word_count = body_words.len();
    let mut findings = Vec::new();
    let mut strengths = Vec::new();

    let (keyword_points, keywords) = score_keywords(input, &body_words, &mut findings);
    if !keywords.is_empty() && findings.iter().all(|f| !f.rule_id.starts_with("seo.keyword")) {
        strengths.push("Target keywords are present, prominent and well balanced".to_string());
    }

    let heading_points = score_headings(input, word_count, &mut findings, &mut strengths);
    let meta_points = score_meta(input.meta_description, &mut findings, &mut strengths);
    let title_len = input.title.trim().chars().count();
    let title_points = score_title(title_len, &mut findings, &mut strengths);
    let length_points = score_length(word_count, &mut findings, &mut strengths);

    let score = (keyword_points + heading_points + meta_points + title_points + length_points)
        .clamp(0.0, 100.0);

    SeoReport {
        score,
        keywords,
        heading_count: input.document.headings().count(),
        meta_description_len: input
            .meta_description
            .map(|m| m.trim().chars().count())
            .filter(|len| *len > 0),
        title_len,
        word_count,
        findings,
        strengths,
    }
}

/// Counts phrase occurrences of `phrase` (already normalized) in `words`.
fn count_phrase(words: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || words.len() < phrase.len() {
        return 0;
    }
    words
        .windows(phrase.len())
        .filter(|window| *window == phrase)
        .count()
}

fn contains_phrase(text: &str, phrase: &[String]) -> bool {
    count_phrase(&normalized_words(text), phrase) > 0
}

fn score_keywords(
    input: &ScoringInput<'_>,
    body_words: &[String],
    findings: &mut Vec<Finding>,
) -> (f64, Vec<KeywordUsage>) {
    let targets: Vec<&String> = input
        .keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .collect();
    if targets.is_empty() {
        findings.push(Finding::new(
            "seo.no_target_keywords",
            Severity::Info,
            "The strategy defines no target keywords; keyword checks were not applied",
        ));
        return (KEYWORD_POINTS, vec![]);
    }

    let per_keyword = KEYWORD_POINTS / targets.len() as f64;
    let mut points = 0.0;
    let mut usages = Vec::new();

    for keyword in targets {
        let phrase = normalized_words(keyword);
        let occurrences = count_phrase(body_words, &phrase);
        let density = if body_words.is_empty() {
            0.0
        } else {
            (occurrences * phrase.len()) as f64 / body_words.len() as f64 * 100.0
        };
        let in_title_or_heading = contains_phrase(input.title, &phrase)
            || input
                .document
                .headings()
                .any(|(_, text)| contains_phrase(text, &phrase));

        if occurrences > 0 || in_title_or_heading {
            points += per_keyword * 0.5;
        } else {
            findings.push(Finding::new(
                "seo.keyword_missing",
                Severity::High,
                format!("Target keyword \"{keyword}\" does not appear in the content"),
            ));
        }

        if in_title_or_heading {
            points += per_keyword * 0.25;
        } else if occurrences > 0 {
            findings.push(Finding::new(
                "seo.keyword_not_in_heading",
                Severity::Low,
                format!("Use \"{keyword}\" in the title or at least one heading"),
            ));
        }

        if (DENSITY_MIN..=DENSITY_MAX).contains(&density) {
            points += per_keyword * 0.25;
        } else if density > DENSITY_STUFFED {
            findings.push(Finding::new(
                "seo.keyword_stuffing",
                Severity::Medium,
                format!(
                    "\"{keyword}\" makes up {density:.1}% of the text; keep it under {DENSITY_MAX}%"
                ),
            ));
        } else if density > DENSITY_MAX {
            findings.push(Finding::new(
                "seo.keyword_density_high",
                Severity::Low,
                format!("\"{keyword}\" density is {density:.1}%; aim for {DENSITY_MIN}–{DENSITY_MAX}%"),
            ));
        } else if occurrences > 0 {
            findings.push(Finding::new(
                "seo.keyword_density_low",
                Severity::Low,
                format!("\"{keyword}\" density is {density:.2}%; aim for {DENSITY_MIN}–{DENSITY_MAX}%"),
            ));
        }

        usages.push(KeywordUsage {
            keyword: keyword.clone(),
            occurrences,
            density,
            in_title_or_heading,
        });
    }

    (points, usages)
}

fn score_headings(
    input: &ScoringInput<'_>,
    word_count: usize,
    findings: &mut Vec<Finding>,
    strengths: &mut Vec<String>,
) -> f64 {
    let headings: Vec<(u8, &str)> = input.document.headings().collect();
    let h2_count = headings.iter().filter(|(level, _)| *level == 2).count();
    let sub_count = headings
        .iter()
        .filter(|(level, _)| *level == 2 || *level == 3)
        .count();
    let mut points = 0.0;

    if h2_count > 0 {
        points += 10.0;
    } else {
        findings.push(Finding::new(
            "seo.missing_h2",
            Severity::High,
            "Add H2 section headings to structure the article",
        ));
    }

    let needed = (word_count / WORDS_PER_SUBHEADING).max(1);
    if sub_count >= needed {
        points += 10.0;
    } else {
        findings.push(Finding::new(
            "seo.sparse_headings",
            Severity::Medium,
            format!(
                "{sub_count} subheadings for {word_count} words; add one every ~{WORDS_PER_SUBHEADING} words"
            ),
        ));
    }

    // The title acts as the H1, so the first body heading may be H1 or H2.
    let mut previous = 1u8;
    let mut skipped = false;
    for (level, _) in &headings {
        if *level > previous + 1 {
            skipped = true;
        }
        previous = *level;
    }
    if skipped {
        findings.push(Finding::new(
            "seo.heading_level_skip",
            Severity::Low,
            "Heading levels skip a step (e.g. H2 straight to H4)",
        ));
    } else {
        points += 5.0;
    }

    if points >= 25.0 {
        strengths.push("Clear heading hierarchy".to_string());
    }
    points
}

fn score_meta(meta: Option<&str>, findings: &mut Vec<Finding>, strengths: &mut Vec<String>) -> f64 {
    let len = meta.map(|m| m.trim().chars().count()).unwrap_or(0);
    match len {
        0 => {
            findings.push(Finding::new(
                "seo.missing_meta_description",
                Severity::Medium,
                "No meta description; write one of 120–160 characters",
            ));
            0.0
        }
        120..=160 => {
            strengths.push("Meta description length is ideal".to_string());
            15.0
        }
        50..=119 | 161..=200 => {
            findings.push(Finding::new(
                "seo.meta_description_length",
                Severity::Low,
                format!("Meta description is {len} characters; 120–160 is ideal"),
            ));
            8.0
        }
        _ => {
            findings.push(Finding::new(
                "seo.meta_description_length",
                Severity::Medium,
                format!("Meta description is {len} characters; 120–160 is ideal"),
            ));
            0.0
        }
    }
}

fn score_title(len: usize, findings: &mut Vec<Finding>, strengths: &mut Vec<String>) -> f64 {
    match len {
        0 => {
            findings.push(Finding::new("seo.missing_title", Severity::High, "Content has no title"));
            0.0
        }
        30..=65 => {
            strengths.push("Title length fits search result snippets".to_string());
            10.0
        }
        _ => {
            findings.push(Finding::new(
                "seo.title_length",
                Severity::Low,
                format!("Title is {len} characters; 30–65 displays best in search results"),
            ));
            5.0
        }
    }
}

fn score_length(words: usize, findings: &mut Vec<Finding>, strengths: &mut Vec<String>) -> f64 {
    let (points, severity) = match words {
        w if w >= 1200 => (10.0, None),
        w if w >= 600 => (6.0, Some(Severity::Low)),
        w if w >= 300 => (3.0, Some(Severity::Medium)),
        _ => (0.0, Some(Severity::High)),
    };
    match severity {
        None => strengths.push(format!("Long-form depth ({words} words)")),
        Some(severity) => findings.push(Finding::new(
            "seo.thin_content",
            severity,
            format!("{words} words; long-form pieces rank best at 1200+ words"),
        )),
    }
    points
}
