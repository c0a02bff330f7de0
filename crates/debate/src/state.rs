//! Debate state machine and per-query session state.
//!
//! Every session starts at `IntentClassified` and ends at `Done` or
//! `Degraded`. Transitions are checked against the legal edge table and
//! recorded so a transcript can be explained after the fact.

use crate::types::{IntentLabel, Turn};
use agora_knowledge::Chunk;
use serde::Serialize;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateState {
    /// Intent label decided, path not yet chosen.
    IntentClassified,
    /// Advocate and skeptic running concurrently.
    ParallelArgument,
    /// Adjudicator scoring the exchange.
    Adjudication,
    /// Synthesizer producing the final answer.
    Synthesis,
    /// Attempt rejected; query amended for the next attempt.
    Retry,
    /// Deterministic rule-based transcript.
    LocalFallback,
    /// Transcript complete. Terminal.
    Done,
    /// Attempt budget spent with a malformed synthesis. Terminal.
    Degraded,
}

impl DebateState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Degraded)
    }
}

impl fmt::Display for DebateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IntentClassified => "IntentClassified",
            Self::ParallelArgument => "ParallelArgument",
            Self::Adjudication => "Adjudication",
            Self::Synthesis => "Synthesis",
            Self::Retry => "Retry",
            Self::LocalFallback => "LocalFallback",
            Self::Done => "Done",
            Self::Degraded => "Degraded",
        };
        f.write_str(name)
    }
}

/// Legal edges:
/// ```text
/// IntentClassified → ParallelArgument | LocalFallback
/// ParallelArgument → Adjudication
/// Adjudication     → Synthesis | Retry | LocalFallback
/// Synthesis        → Done | Retry | Degraded
/// Retry            → ParallelArgument
/// LocalFallback    → Done
/// ```
fn is_legal_transition(from: DebateState, to: DebateState) -> bool {
    use DebateState::*;

    matches!(
        (from, to),
        (IntentClassified, ParallelArgument)
            | (IntentClassified, LocalFallback)
            | (ParallelArgument, Adjudication)
            | (Adjudication, Synthesis)
            | (Adjudication, Retry)
            // low score on the last attempt
            | (Adjudication, LocalFallback)
            | (Synthesis, Done)
            | (Synthesis, Retry)
            | (Synthesis, Degraded)
            | (Retry, ParallelArgument)
            | (LocalFallback, Done)
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub from: DebateState,
    pub to: DebateState,
    /// Attempt number at the time of the transition (0 before the first).
    pub attempt: u32,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IllegalTransition {
    pub from: DebateState,
    pub to: DebateState,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal debate transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Current state plus the transition log.
#[derive(Debug)]
pub struct DebateMachine {
    state: DebateState,
    attempt: u32,
    started: Instant,
    transitions: Vec<TransitionRecord>,
}

impl DebateMachine {
    pub fn new() -> Self {
        Self {
            state: DebateState::IntentClassified,
            attempt: 0,
            started: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> DebateState {
        self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }

    /// Move to `to`. Entering `ParallelArgument` starts a new attempt.
    pub fn advance(&mut self, to: DebateState, reason: Option<&str>) -> Result<(), IllegalTransition> {
        if self.state.is_terminal() || !is_legal_transition(self.state, to) {
            return Err(IllegalTransition {
                from: self.state,
                to,
            });
        }

        if to == DebateState::ParallelArgument {
            self.attempt += 1;
        }

        tracing::debug!(
            from = %self.state,
            to = %to,
            attempt = self.attempt,
            reason = reason.unwrap_or(""),
            "Debate transition"
        );

        self.transitions.push(TransitionRecord {
            from: self.state,
            to,
            attempt: self.attempt,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            reason: reason.map(str::to_string),
        });
        self.state = to;
        Ok(())
    }
}

impl Default for DebateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one query's debate needs; dropped once the response is built.
#[derive(Debug)]
pub struct SessionState {
    /// Current query text, amended with corrective notes on retry
    pub query: String,
    pub context_chunks: Vec<Chunk>,
    pub intent: IntentLabel,
    /// Transcript of the current attempt
    pub turns: Vec<Turn>,
    pub machine: DebateMachine,
}

impl SessionState {
    pub fn new(query: impl Into<String>, context_chunks: Vec<Chunk>, intent: IntentLabel) -> Self {
        Self {
            query: query.into(),
            context_chunks,
            intent,
            turns: Vec::new(),
            machine: DebateMachine::new(),
        }
    }

    pub fn attempt_count(&self) -> u32 {
        self.machine.attempt()
    }
}
