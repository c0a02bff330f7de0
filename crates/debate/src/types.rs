//! Debate transcript and response types.

use crate::state::TransitionRecord;
use agora_knowledge::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One contribution to the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Name of the agent that produced the content
    pub agent: String,
    pub content: String,
}

impl Turn {
    pub fn new(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            content: content.into(),
        }
    }
}

/// Coarse question type, announced to every agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentLabel {
    /// Costs, prices and other numeric comparisons
    FactualComparative,
    AnalyticalStrategic,
}

impl IntentLabel {
    /// Label text injected into agent context.
    pub fn as_prompt_text(self) -> &'static str {
        match self {
            Self::FactualComparative => "Type A/B (Factual/Comparative)",
            Self::AnalyticalStrategic => "Type C/D (Analytical/Strategic)",
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_prompt_text())
    }
}

/// How a debate ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Model-backed synthesis in the expected format
    Synthesized,
    /// Deterministic rule-based transcript
    LocalFallback,
    /// Attempt budget spent; the last synthesis is returned marked as degraded
    Degraded,
}

/// Transcript plus how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct DebateOutcome {
    pub turns: Vec<Turn>,
    pub resolution: Resolution,
    /// Model-backed attempts made (0 on the local path without a backend)
    pub attempts: u32,
    pub transitions: Vec<TransitionRecord>,
}

/// What the caller renders for a query.
#[derive(Debug, Clone, Serialize)]
pub struct DebateResponse {
    pub query: String,
    pub turns: Vec<Turn>,
    /// Distinct sources of the retrieved context, sorted
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionRecord>,
}

impl DebateResponse {
    pub fn new(query: impl Into<String>, turns: Vec<Turn>, context: &[Chunk]) -> Self {
        Self {
            query: query.into(),
            turns,
            sources: distinct_sources(context),
            resolution: None,
            transitions: Vec::new(),
        }
    }

    /// Response carrying the resolution and transition log as well.
    pub fn from_outcome(query: impl Into<String>, outcome: DebateOutcome, context: &[Chunk]) -> Self {
        Self {
            resolution: Some(outcome.resolution),
            transitions: outcome.transitions,
            ..Self::new(query, outcome.turns, context)
        }
    }
}

/// Distinct source identifiers of a chunk list, sorted.
pub fn distinct_sources(chunks: &[Chunk]) -> Vec<String> {
    chunks
        .iter()
        .map(|c| c.source.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_sources() {
        let chunks = vec![
            Chunk::new("b.txt", 0, "x"),
            Chunk::new("a.txt", 0, "y"),
            Chunk::new("b.txt", 1, "z"),
        ];
        assert_eq!(distinct_sources(&chunks), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_response_from_outcome_serialization() {
        let outcome = DebateOutcome {
            turns: vec![Turn::new("Agent_Pro", "x")],
            resolution: Resolution::Degraded,
            attempts: 2,
            transitions: Vec::new(),
        };
        let response = DebateResponse::from_outcome("q", outcome, &[Chunk::new("a.txt", 0, "y")]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["resolution"], "degraded");
        assert_eq!(json["sources"][0], "a.txt");
        assert!(json.get("transitions").is_none());

        let plain = serde_json::to_value(DebateResponse::new("q", Vec::new(), &[])).unwrap();
        assert!(plain.get("resolution").is_none());
    }

    #[test]
    fn test_intent_label_serialization() {
        let json = serde_json::to_string(&IntentLabel::FactualComparative).unwrap();
        assert_eq!(json, "\"FACTUAL_COMPARATIVE\"");
        assert_eq!(
            IntentLabel::AnalyticalStrategic.to_string(),
            "Type C/D (Analytical/Strategic)"
        );
    }
}
