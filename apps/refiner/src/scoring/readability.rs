//! Reading-ease analysis (sentence / word / syllable statistics).
//!
//! `analyze` expects prose with markdown already stripped
//! (see `Document::plain_text`). The score is the classic 0–100 reading-ease
//! scale where higher means simpler text.

use serde::{Deserialize, Serialize};

use crate::errors::InsufficientContent;
use crate::scoring::intent_gap::{gap, GapCurve};
use crate::scoring::text::{split_sentences, words};
use crate::scoring::{Finding, ScoringInput, Severity};

const LONG_SENTENCE_WORDS: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityReport {
    pub score: f64,
    /// True when the text was too degenerate to analyze.
    pub skipped: bool,
    pub actual: Option<f64>,
    pub target: f64,
    pub gap: Option<f64>,
    pub stats: Option<ReadabilityStats>,
    pub findings: Vec<Finding>,
    pub strengths: Vec<String>,
}

/// Readability dimension: intent gap between actual and target reading ease.
pub fn score_readability(input: &ScoringInput<'_>, curve: &GapCurve) -> ReadabilityReport {
    let target = input.target_reading_ease;
    let stats = match analyze(&input.plain_text) {
        Ok(stats) => stats,
        Err(e) => {
            return ReadabilityReport {
                score: 0.0,
                skipped: true,
                actual: None,
                target,
                gap: None,
                stats: None,
                findings: vec![Finding::new(
                    "readability.insufficient_content",
                    Severity::High,
                    format!("{e}; the body needs real prose before it can be scored"),
                )],
                strengths: vec![],
            }
        }
    };

    let actual = stats.reading_ease;
    let g = gap(actual, target);
    let mut findings = Vec::new();
    let mut strengths = Vec::new();

    if g > 5.0 {
        let severity = if g > 20.0 {
            Severity::High
        } else if g > 10.0 {
            Severity::Medium
        } else {
            Severity::Low
        };
        if actual < target {
            findings.push(Finding::new(
                "readability.too_complex",
                severity,
                format!(
                    "Reading ease {actual:.1} is below the audience target {target:.1}; \
                     use shorter sentences and plainer words"
                ),
            ));
        } else {
            findings.push(Finding::new(
                "readability.too_simple",
                severity,
                format!(
                    "Reading ease {actual:.1} is above the audience target {target:.1}; \
                     use more precise vocabulary and fuller sentences"
                ),
            ));
        }
    } else {
        strengths.push(format!(
            "Reading level matches the audience ({actual:.1} vs target {target:.1})"
        ));
    }

    if stats.avg_sentence_len() > LONG_SENTENCE_WORDS {
        findings.push(Finding::new(
            "readability.long_sentences",
            Severity::Medium,
            format!(
                "Average sentence length is {:.1} words; aim for under {LONG_SENTENCE_WORDS}",
                stats.avg_sentence_len()
            ),
        ));
    }

    ReadabilityReport {
        score: curve.score(g),
        skipped: false,
        actual: Some(actual),
        target,
        gap: Some(g),
        stats: Some(stats),
        findings,
        strengths,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityStats {
    pub sentences: usize,
    pub words: usize,
    pub syllables: usize,
    /// 0–100, clamped.
    pub reading_ease: f64,
    /// Flesch–Kincaid grade, floored at 0.
    pub grade_level: f64,
}

impl ReadabilityStats {
    pub fn avg_sentence_len(&self) -> f64 {
        self.words as f64 / self.sentences as f64
    }
}

pub fn analyze(plain_text: &str) -> Result<ReadabilityStats, InsufficientContent> {
    let sentences = split_sentences(plain_text).len();
    let tokens: Vec<&str> = words(plain_text).collect();
    let word_count = tokens.len();

    if word_count == 0 {
        return Err(InsufficientContent("text contains no words".to_string()));
    }
    if sentences == 0 {
        return Err(InsufficientContent("text contains no sentences".to_string()));
    }

    let syllables: usize = tokens.iter().map(|w| count_syllables(w)).sum();
    let wps = word_count as f64 / sentences as f64;
    let spw = syllables as f64 / word_count as f64;

    Ok(ReadabilityStats {
        sentences,
        words: word_count,
        syllables,
        reading_ease: reading_ease(word_count, sentences, syllables),
        grade_level: (0.39 * wps + 11.8 * spw - 15.59).max(0.0),
    })
}

/// `206.835 − 1.015×(words/sentences) − 84.6×(syllables/words)`, clamped to [0, 100].
pub fn reading_ease(words: usize, sentences: usize, syllables: usize) -> f64 {
    let wps = words as f64 / sentences as f64;
    let spw = syllables as f64 / words as f64;
    (206.835 - 1.015 * wps - 84.6 * spw).clamp(0.0, 100.0)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Vowel-group syllable estimate with silent-e and suffix adjustments. Minimum 1.
pub fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let n = letters.len();
    if n <= 3 {
        return 1;
    }

    let mut groups = 0usize;
    let mut prev_vowel = false;
    for &c in &letters {
        let v = is_vowel(c);
        if v && !prev_vowel {
            groups += 1;
        }
        prev_vowel = v;
    }

    let last = letters[n - 1];
    let before_last = letters[n - 2];
    let consonant = |c: char| !is_vowel(c);

    // silent trailing "e" (but "-le" after a consonant is voiced: "ta-ble")
    if last == 'e' && consonant(before_last) {
        let le_ending = before_last == 'l' && consonant(letters[n - 3]);
        if !le_ending {
            groups = groups.saturating_sub(1);
        }
    }

    if last == 's' && before_last == 'e' {
        let c = letters[n - 3];
        let sibilant = matches!(c, 's' | 'x' | 'z' | 'c' | 'g')
            || (c == 'h' && matches!(letters[n - 4], 'c' | 's'));
        if consonant(c) && !sibilant {
            groups = groups.saturating_sub(1);
        }
    }

    if last == 'd' && before_last == 'e' {
        let c = letters[n - 3];
        if consonant(c) && c != 't' && c != 'd' {
            groups = groups.saturating_sub(1);
        }
    }

    groups.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::text::Document;

    fn input(text: &str, target: f64) -> ScoringInput<'static> {
        let document = Document::parse(text);
        let plain_text = document.plain_text();
        ScoringInput {
            title: "",
            meta_description: None,
            document,
            plain_text,
            target_reading_ease: target,
            keywords: &[],
        }
    }

    #[test]
    fn test_report_on_target_has_no_findings() {
        let report = score_readability(
            &input("The cat sat on the mat. The dog ran.", 100.0),
            &GapCurve::default(),
        );
        assert_eq!(report.score, 100.0);
        assert_eq!(report.gap, Some(0.0));
        assert!(report.findings.is_empty());
        assert_eq!(report.strengths.len(), 1);
    }

    #[test]
    fn test_report_too_simple_for_expert_audience() {
        let report = score_readability(
            &input("The cat sat on the mat. The dog ran.", 58.0),
            &GapCurve::default(),
        );
        // gap 42 → max(10, 35 − 12) = 23
        assert_eq!(report.score, 23.0);
        assert_eq!(report.findings[0].rule_id, "readability.too_simple");
        assert_eq!(report.findings[0].severity, Severity::High);
    }

    #[test]
    fn test_report_too_complex_and_long_sentences() {
        let text = "Organizational interoperability considerations necessitate comprehensive \
                    infrastructural modernization initiatives across heterogeneous environments \
                    while simultaneously accommodating regulatory documentation requirements \
                    and institutional governance expectations throughout implementation \
                    for every participating department and regional office.";
        let report = score_readability(&input(text, 70.0), &GapCurve::default());
        let rules: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(rules.contains(&"readability.too_complex"));
        assert!(rules.contains(&"readability.long_sentences"));
        assert!(report.score < 50.0);
    }

    #[test]
    fn test_report_degenerate_text_is_skipped_with_zero() {
        let report = score_readability(&input("```\ncode only\n```", 60.0), &GapCurve::default());
        assert!(report.skipped);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.actual, None);
        assert_eq!(report.findings[0].rule_id, "readability.insufficient_content");
    }

    #[test]
    fn test_syllables_short_words() {
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("a"), 1);
    }

    #[test]
    fn test_syllables_vowel_groups() {
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("readability"), 5);
        assert_eq!(count_syllables("coffee"), 2);
    }

    #[test]
    fn test_syllables_silent_e() {
        assert_eq!(count_syllables("home"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("simple"), 2);
        assert_eq!(count_syllables("agree"), 2);
    }

    #[test]
    fn test_syllables_suffix_exceptions() {
        assert_eq!(count_syllables("makes"), 1);
        assert_eq!(count_syllables("lines"), 1);
        assert_eq!(count_syllables("boxes"), 2);
        assert_eq!(count_syllables("places"), 2);
        assert_eq!(count_syllables("churches"), 2);
        assert_eq!(count_syllables("jumped"), 1);
        assert_eq!(count_syllables("wanted"), 2);
        assert_eq!(count_syllables("played"), 1);
    }

    #[test]
    fn test_syllables_ignore_punctuation_and_case() {
        assert_eq!(count_syllables("Beautiful,"), 3);
        assert_eq!(count_syllables("2024"), 1);
    }

    #[test]
    fn test_reading_ease_formula() {
        // 206.835 - 1.015*20 - 84.6*1.5 = 59.635
        let score = reading_ease(100, 5, 150);
        assert!((score - 59.635).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_reading_ease_clamped() {
        assert_eq!(reading_ease(6, 1, 6), 100.0);
        assert_eq!(reading_ease(60, 1, 200), 0.0);
    }

    #[test]
    fn test_analyze_simple_text() {
        let stats = analyze("The cat sat on the mat. The dog ran.").unwrap();
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.words, 9);
        assert_eq!(stats.syllables, 9);
        assert_eq!(stats.reading_ease, 100.0);
        assert!((stats.avg_sentence_len() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_complex_text_scores_lower() {
        let simple = analyze("We fix the site. It is fast now. You can read it.").unwrap();
        let complex = analyze(
            "Organizational interoperability considerations necessitate comprehensive \
             infrastructural modernization initiatives across heterogeneous environments.",
        )
        .unwrap();
        assert!(complex.reading_ease < simple.reading_ease);
        assert!(complex.grade_level > simple.grade_level);
    }

    #[test]
    fn test_analyze_empty_is_insufficient() {
        assert!(analyze("").is_err());
        assert!(analyze("   ... ").is_err());
    }
}
