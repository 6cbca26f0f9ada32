//! LLM prompt constants for targeted content rewrites.
//!
//! The model returns `{"body": "...", "notes": "..."}`. `rewrite::parse_rewrite`
//! also accepts plain markdown when the model ignores the JSON instruction.

use crate::scoring::Dimension;

pub const REWRITE_SYSTEM: &str = "\
You are a senior content editor. You revise long-form articles to fix specific, \
listed quality issues while leaving everything else intact. The body is markdown: \
keep headings, lists, tables and links as markdown.\n\
\n\
Respond with valid JSON only: {\"body\": \"<full revised markdown>\", \"notes\": \"<one sentence on what changed>\"}\n\
Do NOT use markdown code fences around the JSON. Do NOT add any explanation outside the JSON object.";

pub const REWRITE_PROMPT_TEMPLATE: &str = "\
Revise the article below to improve its {dimensions}.\n\
\n\
TITLE: {title}\n\
AUDIENCE: {audience}\n\
TARGET READING EASE: {target_reading_ease} (0-100 scale, higher is simpler)\n\
CURRENT READING EASE: {actual_reading_ease}\n\
TONE: {tone}\n\
TARGET KEYWORDS: {keywords}\n\
\n\
ISSUES TO FIX (and only these):\n\
{findings}\n\
\n\
HOW TO FIX THEM:\n\
{guidance}\n\
\n\
{preserve}\n\
\n\
ARTICLE:\n\
{body}\n\
\n\
Return JSON only: {\"body\": \"full revised article\", \"notes\": \"what changed\"}";

/// Dimension-specific editing rules.
pub fn dimension_guidance(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Readability => "\
- Move the reading ease toward the target: shorter sentences and plainer words to raise it, \
fuller sentences and precise vocabulary to lower it\n\
- Split sentences longer than 25 words\n\
- Keep technical terms the audience expects",
        Dimension::Seo => "\
- Use each target keyword naturally in the body and in at least one heading\n\
- Keep keyword density between 0.5% and 2.5%; never stuff\n\
- Add H2/H3 subheadings roughly every 300 words without skipping levels",
        Dimension::Aeo => "\
- Phrase key headings as the questions readers ask\n\
- Follow each question heading with a direct 8-60 word answer paragraph\n\
- Add a list or table, an FAQ section and a short summary section where they fit\n\
- Define the main topic early in one plain sentence",
        Dimension::Engagement => "\
- Open with a hook: a question, a concrete number or an \"imagine\" scenario\n\
- Address the reader as \"you\" and ask an occasional question\n\
- Vary paragraph length and keep paragraphs under 120 words\n\
- End with a clear call to action",
        Dimension::FactCheck => "\
- Attribute statistics and claims to their source in the text\n\
- Soften or remove claims that cannot be supported\n\
- Never add new statistics, numbers or sources",
    }
}
