//! Index command handler.

use super::print_json;
use crate::context::AppContext;
use agora_core::AppResult;
use agora_knowledge::RefreshOutcome;
use clap::Args;
use std::time::Instant;

/// Build or refresh the index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Rebuild even when the corpus is unchanged
    #[arg(long)]
    pub force: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!(force = self.force, "Executing index command");

        let start = Instant::now();
        let outcome = ctx.retrieval.refresh_index(self.force).await?;
        let duration_secs = start.elapsed().as_secs_f64();

        if self.json {
            return print_json(&serde_json::json!({
                "result": outcome,
                "durationSecs": duration_secs,
            }));
        }

        match outcome {
            RefreshOutcome::Loaded { chunks } => {
                println!("Index up to date ({} chunks)", chunks)
            }
            RefreshOutcome::Rebuilt { chunks, sources } => println!(
                "Indexed {} documents ({} chunks) in {:.2}s",
                sources, chunks, duration_secs
            ),
            RefreshOutcome::Empty => println!(
                "No documents found in {}",
                ctx.config.corpus_dir().display()
            ),
        }

        Ok(())
    }
}
