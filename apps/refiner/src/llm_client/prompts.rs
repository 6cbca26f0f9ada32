// Shared prompt fragments.
// Each module that calls the generator defines its own prompts.rs alongside it.

/// Appended to every rewrite prompt: scope the edit, never invent.
pub const PRESERVE_INSTRUCTION: &str = "\
    CRITICAL: Change only what the listed issues require. \
    Keep every other heading, paragraph, fact, link and the overall structure as written. \
    Do NOT invent statistics, quotes, studies or sources. \
    If an issue cannot be fixed without inventing facts, leave that part unchanged.";
