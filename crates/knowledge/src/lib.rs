//! Knowledge retrieval for Agora.
//!
//! Indexes a directory of plain-text documents and answers queries with a
//! two-stage search: exact Euclidean nearest neighbours over chunk
//! embeddings, then lexical re-scoring with boost terms.
//!
//! # Example
//! ```no_run
//! use agora_core::AppConfig;
//! use agora_knowledge::RetrievalEngine;
//!
//! # async fn example() -> agora_core::AppResult<()> {
//! let config = AppConfig::load()?;
//! let engine = RetrievalEngine::from_config(&config)?;
//! engine.warm_up().await?;
//! for chunk in engine.search("how much is tuition", 5).await? {
//!     println!("{}: {}", chunk.source, chunk.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod corpus;
pub mod embeddings;
pub mod ranking;
pub mod retrieval;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use corpus::{Corpus, CorpusEntry, DirectoryCorpus};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use retrieval::{RetrievalEngine, RetrievalOptions};
pub use store::IndexStore;
pub use types::{Chunk, IndexStatus, RefreshOutcome, ScoredChunk};
pub use vector_index::{FlatL2Index, VectorIndex};
