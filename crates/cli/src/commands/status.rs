//! Status command handler.

use super::print_json;
use crate::context::AppContext;
use agora_core::AppResult;
use clap::Args;

/// Show index status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Executing status command");

        let status = ctx.retrieval.status().await;

        if self.json {
            return print_json(&status);
        }

        println!("Knowledge base: {}", ctx.config.corpus_dir().display());
        println!("  Ready: {}", status.ready);
        println!("  Chunks: {}", status.chunk_count);
        if status.files_indexed.is_empty() {
            println!("  Files: (none)");
        } else {
            println!("  Files:");
            for file in &status.files_indexed {
                println!("    - {}", file);
            }
        }
        println!(
            "  Completion: {}",
            if ctx.config.llm.is_configured() {
                "model-backed"
            } else {
                "local mode"
            }
        );

        Ok(())
    }
}
