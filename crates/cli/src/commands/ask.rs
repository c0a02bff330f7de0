//! Ask command handler.
//!
//! Retrieves context for the question and runs the debate over it.

use super::{print_json, NO_RESULTS_MESSAGE};
use crate::context::AppContext;
use agora_core::AppResult;
use agora_debate::DebateResponse;
use agora_knowledge::Chunk;
use clap::Args;

/// Ask a question and run the debate
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Number of passages to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let top_k = self.top_k.unwrap_or_else(|| ctx.default_top_k());
        let chunks = retrieve(ctx, &self.query, top_k).await;

        if chunks.is_empty() {
            if self.json {
                print_json(&serde_json::json!({
                    "query": self.query,
                    "response": NO_RESULTS_MESSAGE,
                }))?;
            } else {
                println!("{}", NO_RESULTS_MESSAGE);
            }
            return Ok(());
        }

        let outcome = ctx.orchestrator.resolve(&self.query, &chunks).await;
        tracing::debug!(
            resolution = ?outcome.resolution,
            attempts = outcome.attempts,
            transitions = outcome.transitions.len(),
            "Debate finished"
        );
        let response = DebateResponse::from_outcome(self.query.clone(), outcome, &chunks);

        if self.json {
            print_json(&response)?;
        } else {
            print_transcript(&response);
        }

        Ok(())
    }
}

/// Search, treating retrieval failures as "nothing found".
async fn retrieve(ctx: &AppContext, query: &str, top_k: usize) -> Vec<Chunk> {
    match ctx.retrieval.search(query, top_k).await {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::warn!("Retrieval failed: {}", e);
            Vec::new()
        }
    }
}

fn print_transcript(response: &DebateResponse) {
    for turn in &response.turns {
        println!("[{}]", turn.agent);
        println!("{}", turn.content);
        println!();
    }

    println!("Sources:");
    for source in &response.sources {
        println!("- {}", source);
    }
}
