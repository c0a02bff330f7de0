//! Query classification by ordered trigger tables.
//!
//! Triggers match whole words of the lower-cased query. A multi-word trigger
//! such as "how much" matches a contiguous run of words.

use crate::types::IntentLabel;
use unicode_segmentation::UnicodeSegmentation;

/// Rules are tried in order; the first match wins.
const INTENT_RULES: &[(IntentLabel, &[&str])] = &[(
    IntentLabel::FactualComparative,
    &[
        "cost", "costs", "how much", "price", "prices", "fee", "fees", "tuition", "expensive",
        "cheaper",
    ],
)];

const DEFAULT_INTENT: IntentLabel = IntentLabel::AnalyticalStrategic;

/// Lower-cased words of a query, for trigger matching.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    words: Vec<String>,
}

impl QueryTerms {
    pub fn new(query: &str) -> Self {
        Self {
            words: query
                .to_lowercase()
                .unicode_words()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Whether the trigger appears as a word or contiguous word sequence.
    pub fn matches(&self, trigger: &str) -> bool {
        let phrase: Vec<&str> = trigger.unicode_words().collect();
        if phrase.is_empty() || phrase.len() > self.words.len() {
            return false;
        }

        self.words
            .windows(phrase.len())
            .any(|window| window.iter().zip(&phrase).all(|(word, p)| word == p))
    }

    pub fn matches_any(&self, triggers: &[&str]) -> bool {
        triggers.iter().any(|t| self.matches(t))
    }
}

/// Classify the query's intent.
pub fn classify_intent(query: &str) -> IntentLabel {
    let terms = QueryTerms::new(query);
    INTENT_RULES
        .iter()
        .find(|(_, triggers)| terms.matches_any(triggers))
        .map(|(label, _)| *label)
        .unwrap_or(DEFAULT_INTENT)
}
