//! Answer engine optimization: how easily an AI answer engine can lift a
//! direct, quotable answer out of the content.

use serde::{Deserialize, Serialize};

use crate::scoring::text::{words, Block};
use crate::scoring::{Finding, ScoringInput, Severity};

const ANSWER_MIN_WORDS: usize = 8;
const ANSWER_MAX_WORDS: usize = 60;

const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "who", "which", "can", "should", "is", "are", "does",
    "do",
];
const DEFINITION_PHRASES: &[&str] = &[" is a ", " is an ", " refers to ", " means ", " is defined as "];
const SUMMARY_HEADINGS: &[&str] = &["summary", "key takeaways", "tl;dr", "in short", "conclusion"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AeoReport {
    pub score: f64,
    pub question_headings: usize,
    pub answered_questions: usize,
    pub structured_blocks: usize,
    pub has_faq: bool,
    pub has_definition: bool,
    pub has_summary: bool,
    pub findings: Vec<Finding>,
    pub strengths: Vec<String>,
}

fn is_question_heading(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.ends_with('?') {
        return true;
    }
    let first = trimmed
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    QUESTION_WORDS.contains(&first.as_str())
}

fn is_direct_answer(paragraph: &str) -> bool {
    (ANSWER_MIN_WORDS..=ANSWER_MAX_WORDS).contains(&words(paragraph).count())
}

/// For every question heading, the first paragraph that follows it before the
/// next heading (if any).
fn question_answers(blocks: &[Block]) -> Vec<Option<&str>> {
    let mut answers = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        let Block::Heading { text, .. } = block else {
            continue;
        };
        if !is_question_heading(text) {
            continue;
        }
        let answer = blocks[i + 1..]
            .iter()
            .take_while(|b| !matches!(b, Block::Heading { .. }))
            .find_map(|b| match b {
                Block::Paragraph(p) => Some(p.as_str()),
                _ => None,
            });
        answers.push(answer);
    }
    answers
}

pub fn score_aeo(input: &ScoringInput<'_>) -> AeoReport {
    let document = &input.document;
    let mut findings = Vec::new();
    let mut strengths = Vec::new();
    let mut score = 0.0;

    // Question headings (25)
    let answers = question_answers(&document.blocks);
    let question_headings = answers.len();
    match question_headings {
        0 => findings.push(Finding::new(
            "aeo.no_question_headings",
            Severity::High,
            "Phrase some headings as the questions readers actually ask",
        )),
        1 => {
            score += 15.0;
            findings.push(Finding::new(
                "aeo.few_question_headings",
                Severity::Low,
                "Only one question-style heading; add at least one more",
            ));
        }
        _ => {
            score += 25.0;
            strengths.push(format!("{question_headings} question-style headings"));
        }
    }

    // Direct answers (25)
    let answered_questions = answers
        .iter()
        .filter(|a| a.is_some_and(is_direct_answer))
        .count();
    if question_headings > 0 {
        score += answered_questions as f64 / question_headings as f64 * 25.0;
        if answered_questions < question_headings {
            findings.push(Finding::new(
                "aeo.indirect_answers",
                Severity::Medium,
                format!(
                    "{} of {question_headings} question headings are not followed by a direct \
                     {ANSWER_MIN_WORDS}–{ANSWER_MAX_WORDS} word answer",
                    question_headings - answered_questions
                ),
            ));
        } else {
            strengths.push("Every question is answered directly".to_string());
        }
    } else if document.paragraphs().next().is_some_and(is_direct_answer) {
        score += 10.0;
    } else {
        findings.push(Finding::new(
            "aeo.no_direct_answer",
            Severity::Medium,
            "Open with a concise paragraph that answers the main question directly",
        ));
    }

    // Lists and tables (15)
    let structured_blocks = document.structured_blocks();
    match structured_blocks {
        0 => findings.push(Finding::new(
            "aeo.no_structured_content",
            Severity::Medium,
            "Add a list or table that answer engines can extract",
        )),
        1 => score += 10.0,
        _ => {
            score += 15.0;
            strengths.push("Extractable lists and tables".to_string());
        }
    }

    // FAQ section (15)
    let has_faq = document.headings().any(|(_, text)| {
        let lower = text.to_lowercase();
        lower.contains("faq") || lower.contains("frequently asked")
    });
    if has_faq {
        score += 15.0;
        strengths.push("Has an FAQ section".to_string());
    } else {
        findings.push(Finding::new(
            "aeo.no_faq",
            Severity::Low,
            "Add an FAQ section with short question and answer pairs",
        ));
    }

    // Definitions (10)
    let has_definition = document.paragraphs().take(3).any(|p| {
        let padded = format!(" {} ", p.to_lowercase());
        DEFINITION_PHRASES.iter().any(|phrase| padded.contains(phrase))
    });
    if has_definition {
        score += 10.0;
    } else {
        findings.push(Finding::new(
            "aeo.no_definition",
            Severity::Low,
            "Define the main topic early (\"X is a ...\")",
        ));
    }

    // Summary (10)
    let has_summary = document.headings().any(|(_, text)| {
        let lower = text.to_lowercase();
        SUMMARY_HEADINGS.iter().any(|s| lower.contains(s))
    });
    if has_summary {
        score += 10.0;
    } else {
        findings.push(Finding::new(
            "aeo.no_summary",
            Severity::Low,
            "End with a summary or key takeaways section",
        ));
    }

    AeoReport {
        score: score.clamp(0.0, 100.0),
        question_headings,
        answered_questions,
        structured_blocks,
        has_faq,
        has_definition,
        has_summary,
        findings,
        strengths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::text::Document;

    fn score(body: &str) -> AeoReport {
        let document = Document::parse(body);
        let plain_text = document.plain_text();
        score_aeo(&ScoringInput {
            title: "",
            meta_description: None,
            document,
            plain_text,
            target_reading_ease: 60.0,
            keywords: &[],
        })
    }

    #[test]
    fn test_question_heading_detection() {
        assert!(is_question_heading("What is cold brew?"));
        assert!(is_question_heading("How to grind beans"));
        assert!(is_question_heading("Ready to start?"));
        assert!(!is_question_heading("Brewing basics"));
    }

    #[test]
    fn test_plain_prose_scores_zero() {
        let report = score("Some text without any structure at all.");
        assert_eq!(report.score, 0.0);
        assert_eq!(report.question_headings, 0);
        assert!(report.findings.iter().any(|f| f.rule_id == "aeo.no_question_headings"));
    }

    #[test]
    fn test_answered_questions_counted() {
        let body = "## What is cold brew?\n\n\
                    Cold brew is a coffee made by steeping grounds in cool water for hours.\n\n\
                    ## How long does it steep?\n\n\
                    - 12 hours\n- 18 hours\n\n\
                    Way too short.";
        let report = score(body);
        assert_eq!(report.question_headings, 2);
        // second answer paragraph has 3 words
        assert_eq!(report.answered_questions, 1);
        assert!(report.has_definition);
        assert_eq!(report.structured_blocks, 1);
        // 25 headings + 12.5 answers + 10 list + 10 definition
        assert_eq!(report.score, 57.5);
    }

    #[test]
    fn test_fully_optimized_scores_100() {
        let body = "## What is cold brew?\n\n\
                    Cold brew is a coffee made by steeping grounds in cool water for hours.\n\n\
                    ## How do you serve it?\n\n\
                    Serve it over ice, diluted with water or milk to taste, in a tall glass.\n\n\
                    - Coarse grind\n- Cold water\n\n\
                    | Ratio | Strength |\n|---|---|\n| 1:4 | Strong |\n\n\
                    ## FAQ\n\n\
                    Cold brew keeps for about two weeks in the fridge.\n\n\
                    ## Key takeaways\n\n\
                    Steep long, grind coarse, and dilute to taste.";
        let report = score(body);
        assert!(report.has_faq && report.has_summary);
        assert_eq!(report.score, 100.0, "{:?}", report.findings);
    }

    #[test]
    fn test_direct_opening_without_question_headings() {
        let report = score("Cold brew is a smooth coffee made by steeping grounds in cold water.");
        // 10 direct opening + 10 definition
        assert_eq!(report.score, 20.0);
    }
}
