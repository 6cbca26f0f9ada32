//! Markdown structure and plain-text helpers shared by every dimension scorer.
//!
//! Scorers never look at raw markdown directly. `Document::parse` turns the body
//! into a flat list of blocks (headings, paragraphs, lists, tables) with inline
//! markup stripped, and `Document::plain_text` produces the prose the
//! readability analyzer counts.

use std::sync::OnceLock;

use regex::Regex;

/// One structural block of a markdown body.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    List(Vec<String>),
    Table { rows: usize },
    Code,
}

/// A parsed markdown body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn parse(markdown: &str) -> Self {
        let mut parser = Parser::default();
        for line in markdown.lines() {
            parser.line(line);
        }
        parser.finish()
    }

    pub fn headings(&self) -> impl Iterator<Item = (u8, &str)> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Heading { level, text } => Some((*level, text.as_str())),
            _ => None,
        })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of list and table blocks.
    pub fn structured_blocks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::List(_) | Block::Table { .. }))
            .count()
    }

    /// Prose for sentence statistics. Headings and list items without terminal
    /// punctuation are closed with a period so each counts as one sentence.
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Heading { text, .. } => parts.push(close_sentence(text)),
                Block::Paragraph(text) => parts.push(text.clone()),
                Block::List(items) => parts.extend(items.iter().map(|i| close_sentence(i))),
                Block::Table { .. } | Block::Code => {}
            }
        }
        parts.retain(|p| !p.trim().is_empty());
        parts.join(" ")
    }

    pub fn word_count(&self) -> usize {
        words(&self.plain_text()).count()
    }
}

#[derive(Default)]
struct Parser {
    blocks: Vec<Block>,
    paragraph: Vec<String>,
    list: Vec<String>,
    table_rows: usize,
    in_code: bool,
}

impl Parser {
    fn line(&mut self, raw: &str) {
        let line = raw.trim();

        if line.starts_with("```") || line.starts_with("~~~") {
            if self.in_code {
                self.in_code = false;
                self.blocks.push(Block::Code);
            } else {
                self.flush();
                self.in_code = true;
            }
            return;
        }
        if self.in_code {
            return;
        }

        if line.is_empty() {
            self.flush();
            return;
        }

        if let Some(caps) = heading_re().captures(line) {
            self.flush();
            let level = caps[1].len() as u8;
            let text = strip_inline(caps[2].trim_end_matches('#').trim());
            self.blocks.push(Block::Heading { level, text });
            return;
        }

        if line.starts_with('|') {
            self.flush_paragraph();
            self.flush_list();
            if !table_separator_re().is_match(line) {
                self.table_rows += 1;
            }
            return;
        }
        self.flush_table();

        if let Some(caps) = list_item_re().captures(line) {
            self.flush_paragraph();
            self.list.push(strip_inline(caps[2].trim()));
            return;
        }

        // A non-item line directly under a list item continues that item.
        if let Some(last) = self.list.last_mut() {
            last.push(' ');
            last.push_str(&strip_inline(line));
            return;
        }

        let text = line.trim_start_matches('>').trim();
        if !text.is_empty() {
            self.paragraph.push(strip_inline(text));
        }
    }

    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let text = self.paragraph.join(" ");
            self.paragraph.clear();
            self.blocks.push(Block::Paragraph(text));
        }
    }

    fn flush_list(&mut self) {
        if !self.list.is_empty() {
            self.blocks.push(Block::List(std::mem::take(&mut self.list)));
        }
    }

    fn flush_table(&mut self) {
        if self.table_rows > 0 {
            self.blocks.push(Block::Table {
                rows: self.table_rows,
            });
            self.table_rows = 0;
        }
    }

    fn flush(&mut self) {
        self.flush_paragraph();
        self.flush_list();
        self.flush_table();
    }

    fn finish(mut self) -> Document {
        self.flush();
        Document {
            blocks: self.blocks,
        }
    }
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("heading regex"))
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([-*+]|\d+[.)])\s+(.*)$").expect("list regex"))
}

fn table_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\|?[\s:|-]+\|?$").expect("table separator regex"))
}

fn inline_res() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            (r"!\[([^\]]*)\]\([^)]*\)", "$1"),
            (r"\[([^\]]+)\]\([^)]*\)", "$1"),
            (r"`([^`]*)`", "$1"),
            (r"<[^>]+>", ""),
            (r"\*\*|__|~~|\*", ""),
        ]
        .into_iter()
        .map(|(pattern, rep)| (Regex::new(pattern).expect("inline regex"), rep))
        .collect()
    })
}

/// Removes inline markdown (links, images, code spans, emphasis, html tags).
pub fn strip_inline(text: &str) -> String {
    let mut out = text.to_string();
    for (re, rep) in inline_res() {
        out = re.replace_all(&out, *rep).into_owned();
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn close_sentence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.ends_with(['.', '!', '?', ':']) {
        trimmed.to_string()
    } else {
        format!("{trimmed}.")
    }
}

/// Whitespace-delimited tokens containing at least one alphanumeric character.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(|t| t.chars().any(|c| c.is_alphanumeric()))
}

/// Lowercased alphanumeric word forms, used for keyword and overlap matching.
pub fn normalized_words(text: &str) -> Vec<String> {
    words(text)
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "inc", "ltd", "co", "corp",
    "e.g", "i.e", "approx", "no", "fig", "u.s",
];

/// Splits prose into sentences on `.`, `!` and `?`, keeping the terminator.
///
/// Periods after known abbreviations, single-letter initials, inside decimals,
/// or not followed by whitespace (domains, versions) do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        current.push(c);

        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j], '.' | '!' | '?' | '"' | '\'' | ')') {
                current.push(chars[j]);
                j += 1;
            }
            let run_is_single_period = c == '.' && j == i + 1;
            let at_end = j >= chars.len();
            let followed_by_space = at_end || chars[j].is_whitespace();

            let boundary = if !followed_by_space {
                false
            } else if run_is_single_period {
                !ends_with_abbreviation(&current[..current.len() - 1])
            } else {
                true
            };

            if boundary {
                push_sentence(&mut sentences, &mut current);
            }
            i = j;
            continue;
        }
        i += 1;
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if trimmed.chars().any(|c| c.is_alphanumeric()) {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

fn ends_with_abbreviation(before_period: &str) -> bool {
    let token: String = before_period
        .chars()
        .rev()
        .take_while(|c| c.is_alphabetic() || *c == '.')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let token = token.trim_start_matches('.').to_lowercase();
    if token.is_empty() {
        return false;
    }
    if token.chars().count() == 1 {
        return true;
    }
    ABBREVIATIONS.contains(&token.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "# How to Brew Coffee\n\
        \n\
        Coffee is a **brewed** drink. Read [our guide](https://example.com) first.\n\
        \n\
        ## What beans should you buy?\n\
        \n\
        - Fresh beans\n\
        - A burr grinder\n\
        \n\
        | Method | Time |\n\
        |--------|------|\n\
        | Pour over | 3 min |\n\
        \n\
        ```\n\
        let x = 1;\n\
        ```\n";

    #[test]
    fn test_parse_blocks() {
        let doc = Document::parse(ARTICLE);
        let headings: Vec<_> = doc.headings().collect();
        assert_eq!(
            headings,
            vec![(1, "How to Brew Coffee"), (2, "What beans should you buy?")]
        );
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(
            paragraphs,
            vec!["Coffee is a brewed drink. Read our guide first."]
        );
        assert!(doc
            .blocks
            .contains(&Block::List(vec!["Fresh beans".into(), "A burr grinder".into()])));
        assert!(doc.blocks.contains(&Block::Table { rows: 2 }));
        assert!(doc.blocks.contains(&Block::Code));
        assert_eq!(doc.structured_blocks(), 2);
    }

    #[test]
    fn test_plain_text_closes_headings_and_items() {
        let doc = Document::parse(ARTICLE);
        let text = doc.plain_text();
        assert!(text.starts_with("How to Brew Coffee. Coffee is a brewed drink."));
        assert!(text.contains("Fresh beans. A burr grinder."));
        assert!(!text.contains("let x"));
        assert!(!text.contains("Pour over"));
    }

    #[test]
    fn test_strip_inline_markup() {
        assert_eq!(
            strip_inline("See **bold** and `code` and ![alt](x.png) <b>tag</b>"),
            "See bold and code and alt tag"
        );
    }

    #[test]
    fn test_split_sentences_basic() {
        let s = split_sentences("One here. Two here! Three here?");
        assert_eq!(s, vec!["One here.", "Two here!", "Three here?"]);
    }

    #[test]
    fn test_split_sentences_abbreviations_and_decimals() {
        let s = split_sentences("Dr. Smith paid $3.50 for it, e.g. coffee. J. R. Tolkien wrote it.");
        assert_eq!(
            s,
            vec![
                "Dr. Smith paid $3.50 for it, e.g. coffee.",
                "J. R. Tolkien wrote it."
            ]
        );
    }

    #[test]
    fn test_split_sentences_ignores_domains() {
        let s = split_sentences("Visit example.com today. Then leave.");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_split_sentences_punctuation_only_is_empty() {
        assert!(split_sentences("... !!! ??").is_empty());
    }

    #[test]
    fn test_words_skip_symbols() {
        let count = words("Hello - world — 42 !").count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_normalized_words_lowercase_and_trim() {
        assert_eq!(
            normalized_words("Rust, rust! (RUST)"),
            vec!["rust", "rust", "rust"]
        );
    }
}
