//! Document chunking.
//!
//! Splits on the coarsest boundary that fits: paragraphs, then sentences,
//! then words.

use crate::types::Chunk;
use agora_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Character-budget splitter with overlap.
pub struct DocumentChunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl DocumentChunker {
    /// Create a chunker with a target size and overlap, both in characters.
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunking parameters: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    /// Split a document into chunks numbered in document order.
    pub fn split(&self, source: &str, text: &str) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .splitter
            .chunks(text)
            .filter(|piece| !piece.trim().is_empty())
            .enumerate()
            .map(|(sequence_index, piece)| Chunk::new(source, sequence_index, piece))
            .collect();

        tracing::debug!("Split {} into {} chunks ({} bytes)", source, chunks.len(), text.len());
        chunks
    }
}
