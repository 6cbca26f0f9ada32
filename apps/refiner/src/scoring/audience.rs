//! Target reading ease derived from a strategy's free-text audience description.

pub const DEFAULT_TARGET: f64 = 60.0;

/// First matching group wins, so more specific audiences come first.
const AUDIENCE_TARGETS: &[(&[&str], f64)] = &[
    (&["children", "kids", "elementary"], 80.0),
    (&["general public", "consumer", "beginner", "homeowner"], 65.0),
    (&["small business", "professional", "marketer"], 55.0),
    (&["executive", "b2b", "decision maker", "manager"], 45.0),
    (
        &[
            "technical",
            "engineer",
            "developer",
            "expert",
            "academic",
            "legal",
            "medical",
            "scientist",
        ],
        35.0,
    ),
];

pub fn target_for_audience(description: &str) -> f64 {
    let lower = description.to_lowercase();
    AUDIENCE_TARGETS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, target)| *target)
        .unwrap_or(DEFAULT_TARGET)
}
