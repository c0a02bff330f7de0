//! Adjudicator score extraction.

use regex::Regex;
use std::sync::OnceLock;

/// Score assumed when the adjudicator reply contains no number.
pub const DEFAULT_SCORE: f64 = 5.0;

fn number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").ok())
        .as_ref()
}

/// First ASCII integer or decimal in the text, or [`DEFAULT_SCORE`].
///
/// Best effort: "Score: 8/10" yields 8, and "1. Did they answer" yields 1.
pub fn extract_score(text: &str) -> f64 {
    number_pattern()
        .and_then(|re| re.find(text))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_SCORE)
}
