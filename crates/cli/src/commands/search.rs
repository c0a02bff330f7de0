//! Search command handler.

use super::{print_json, NO_RESULTS_MESSAGE};
use crate::context::AppContext;
use agora_core::AppResult;
use clap::Args;

/// Show the passages retrieved for a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of passages to return (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing search command");

        let top_k = self.top_k.unwrap_or_else(|| ctx.default_top_k());
        let results = ctx.retrieval.search_scored(&self.query, top_k).await?;

        if self.json {
            return print_json(&results);
        }

        if results.is_empty() {
            println!("{}", NO_RESULTS_MESSAGE);
            return Ok(());
        }

        for (rank, scored) in results.iter().enumerate() {
            println!(
                "{}. {} #{} (score {:.3}, distance {:.3}, {} boost matches)",
                rank + 1,
                scored.chunk.source,
                scored.chunk.sequence_index,
                scored.final_score,
                scored.distance,
                scored.boost_matches
            );
            println!("   {}", scored.chunk.text.replace('\n', "\n   "));
            println!();
        }

        Ok(())
    }
}
