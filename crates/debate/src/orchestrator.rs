//! Debate orchestration.
//!
//! Drives one query through the debate state machine: concurrent advocate and
//! skeptic turns, adjudication, a score gate, synthesis with a format check,
//! and a bounded retry loop. Without a completion capability the
//! deterministic local debate is used instead.

use crate::agent::AgentRuntime;
use crate::fallback::local_debate;
use crate::intent::classify_intent;
use crate::roles::{ADJUDICATOR, ADVOCATE, SKEPTIC, SYNTHESIZER};
use crate::score::extract_score;
use crate::state::{DebateState, SessionState};
use crate::types::{DebateOutcome, Resolution, Turn};
use agora_core::{AppError, AppResult};
use agora_knowledge::Chunk;
use agora_llm::CompletionCapability;
use std::sync::Arc;
use tracing::{info, warn};

/// Hard cap on advocate/skeptic/adjudicator cycles per query.
pub const MAX_ATTEMPTS: u32 = 2;

/// Minimum adjudicator score for the synthesizer to run.
pub const PASS_SCORE: f64 = 6.0;

/// Prefix marking a synthesis returned after the attempt budget ran out.
pub const DEGRADED_MARKER: &str = "[DEGRADED] ";

const LOW_SCORE_NOTE: &str =
    " (Note: Previous attempt failed to answer specifically. Calculate numbers if asked.)";
const FORMAT_NOTE: &str =
    " (SYSTEM ERROR: You failed to follow the output format. USE 'STEP 1 — DIRECT ANSWER'.)";

/// Any of these in the synthesis means the output format was followed.
const SYNTHESIS_MARKERS: &[&str] = &["STEP 1", "Final Answer"];

/// Render retrieved chunks as agent context.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("Source: {}\nContent: {}", c.source, c.text))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn is_well_formed(synthesis: &str) -> bool {
    SYNTHESIS_MARKERS.iter().any(|m| synthesis.contains(m))
}

fn transition_error(e: crate::state::IllegalTransition) -> AppError {
    AppError::Debate(e.to_string())
}

pub struct DebateOrchestrator {
    runtime: AgentRuntime,
}

impl DebateOrchestrator {
    pub fn new(capability: Arc<dyn CompletionCapability>) -> AppResult<Self> {
        Ok(Self {
            runtime: AgentRuntime::new(capability)?,
        })
    }

    /// Run the debate for `query` over the retrieved chunks.
    ///
    /// Never fails: an internal error is logged and answered with the local
    /// transcript.
    pub async fn conduct_debate(&self, query: &str, chunks: &[Chunk]) -> Vec<Turn> {
        self.resolve(query, chunks).await.turns
    }

    /// Like [`conduct_debate`](Self::conduct_debate) but keeps how the debate
    /// ended and its transition log.
    pub async fn resolve(&self, query: &str, chunks: &[Chunk]) -> DebateOutcome {
        match self.conduct(query, chunks).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Debate failed, using local transcript: {}", e);
                DebateOutcome {
                    turns: local_debate(query, chunks),
                    resolution: Resolution::LocalFallback,
                    attempts: 0,
                    transitions: Vec::new(),
                }
            }
        }
    }

    /// Run the debate and report how it ended.
    pub async fn conduct(&self, query: &str, chunks: &[Chunk]) -> AppResult<DebateOutcome> {
        let intent = classify_intent(query);
        info!(intent = %intent, chunks = chunks.len(), "Intent classified");

        let mut session = SessionState::new(query, chunks.to_vec(), intent);

        if !self.runtime.is_model_backed() {
            return self.finish_locally(query, session, "no completion capability");
        }

        let context = format!(
            "INTENT: {}\nGLOBAL RULE: Answer the question FIRST and EXPLICITLY.\n\n{}",
            intent.as_prompt_text(),
            format_context(&session.context_chunks)
        );

        loop {
            session
                .machine
                .advance(DebateState::ParallelArgument, None)
                .map_err(transition_error)?;
            session.turns.clear();
            let attempt = session.attempt_count();

            let (pro, contra) = futures::join!(
                self.runtime.run(&ADVOCATE, &context, &session.query, &[]),
                self.runtime.run(&SKEPTIC, &context, &session.query, &[]),
            );
            session.turns.push(Turn::new(ADVOCATE.name, pro));
            session.turns.push(Turn::new(SKEPTIC.name, contra));

            session
                .machine
                .advance(DebateState::Adjudication, None)
                .map_err(transition_error)?;
            let verdict = self
                .runtime
                .run(&ADJUDICATOR, &context, &session.query, &session.turns)
                .await;
            let score = extract_score(&verdict);
            info!(attempt, score, "Adjudicator score");
            session.turns.push(Turn::new(ADJUDICATOR.name, verdict));

            let last_attempt = attempt >= MAX_ATTEMPTS;

            if score < PASS_SCORE {
                let reason = format!("score {} below {}", score, PASS_SCORE);
                if last_attempt {
                    warn!(attempt, "Low score on final attempt");
                    session
                        .machine
                        .advance(DebateState::LocalFallback, Some(&reason))
                        .map_err(transition_error)?;
                    return self.finish_locally(query, session, &reason);
                }

                warn!(attempt, "Retrying after low score");
                session
                    .machine
                    .advance(DebateState::Retry, Some(&reason))
                    .map_err(transition_error)?;
                session.query.push_str(LOW_SCORE_NOTE);
                continue;
            }

            session
                .machine
                .advance(DebateState::Synthesis, None)
                .map_err(transition_error)?;
            let synthesis = self
                .runtime
                .run(&SYNTHESIZER, &context, &session.query, &session.turns)
                .await;

            if is_well_formed(&synthesis) {
                session
                    .machine
                    .advance(DebateState::Done, None)
                    .map_err(transition_error)?;
                session.turns.push(Turn::new(SYNTHESIZER.name, synthesis));
                return Ok(DebateOutcome {
                    turns: session.turns,
                    resolution: Resolution::Synthesized,
                    attempts: attempt,
                    transitions: session.machine.into_transitions(),
                });
            }

            if last_attempt {
                warn!(attempt, "Synthesis malformed on final attempt");
                session
                    .machine
                    .advance(DebateState::Degraded, Some("malformed synthesis"))
                    .map_err(transition_error)?;
                session.turns.push(Turn::new(
                    SYNTHESIZER.name,
                    format!("{}{}", DEGRADED_MARKER, synthesis),
                ));
                return Ok(DebateOutcome {
                    turns: session.turns,
                    resolution: Resolution::Degraded,
                    attempts: attempt,
                    transitions: session.machine.into_transitions(),
                });
            }

            warn!(attempt, "Retrying after malformed synthesis");
            session
                .machine
                .advance(DebateState::Retry, Some("malformed synthesis"))
                .map_err(transition_error)?;
            session.query.push_str(FORMAT_NOTE);
        }
    }

    fn finish_locally(
        &self,
        query: &str,
        mut session: SessionState,
        reason: &str,
    ) -> AppResult<DebateOutcome> {
        if session.machine.state() == DebateState::IntentClassified {
            session
                .machine
                .advance(DebateState::LocalFallback, Some(reason))
                .map_err(transition_error)?;
        }
        info!(reason, "Running local debate");

        let turns = local_debate(query, &session.context_chunks);

        session
            .machine
            .advance(DebateState::Done, None)
            .map_err(transition_error)?;

        Ok(DebateOutcome {
            turns,
            resolution: Resolution::LocalFallback,
            attempts: session.attempt_count(),
            transitions: session.machine.into_transitions(),
        })
    }
}
