//! Multi-agent debate over retrieved passages.
//!
//! Four fixed roles argue about a query: an advocate answers from the
//! context, a skeptic looks for what was missed, an adjudicator scores the
//! exchange and a synthesizer writes the final structured answer. Low scores
//! and malformed answers are retried a bounded number of times. Without a
//! language model a deterministic rule-based transcript is produced.

pub mod agent;
pub mod fallback;
pub mod intent;
pub mod orchestrator;
pub mod roles;
pub mod score;
pub mod state;
pub mod types;

pub use agent::AgentRuntime;
pub use fallback::{detect_topic, local_debate, Topic};
pub use intent::classify_intent;
pub use orchestrator::{format_context, DebateOrchestrator, MAX_ATTEMPTS, PASS_SCORE};
pub use roles::{RoleDefinition, ADJUDICATOR, ADVOCATE, ALL_ROLES, SKEPTIC, SYNTHESIZER};
pub use state::{DebateMachine, DebateState, SessionState};
pub use types::{DebateOutcome, DebateResponse, IntentLabel, Resolution, Turn};
