//! Command handlers for the Agora CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod index;
pub mod search;
pub mod status;

pub use ask::AskCommand;
pub use index::IndexCommand;
pub use search::SearchCommand;
pub use status::StatusCommand;

use agora_core::AppResult;
use serde::Serialize;

/// Message shown when retrieval returns nothing for a query.
pub const NO_RESULTS_MESSAGE: &str = "No relevant information found in the knowledge base.";

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
