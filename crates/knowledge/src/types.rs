//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// A passage of a corpus document.
///
/// Chunks are immutable once indexed. `sequence_index` is unique within a
/// `source` and follows document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk content as read from the document
    pub text: String,

    /// File name of the originating document
    pub source: String,

    /// Position of the chunk within its document
    pub sequence_index: usize,

    /// Lower-cased content, used for lexical matching
    pub normalized_text: String,
}

impl Chunk {
    pub fn new(source: impl Into<String>, sequence_index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized_text = text.to_lowercase();
        Self {
            text,
            source: source.into(),
            sequence_index,
            normalized_text,
        }
    }
}

/// A chunk together with its retrieval scores.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// Squared Euclidean distance to the query embedding
    pub distance: f32,

    /// `1 / (1 + distance)`, possibly demoted
    pub semantic_score: f32,

    /// Number of boost terms found in the chunk
    pub boost_matches: usize,

    /// Score used for the final ordering
    pub final_score: f32,
}

/// Snapshot of the index for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    /// Whether a non-empty index is loaded
    pub ready: bool,

    pub chunk_count: usize,

    /// Distinct source documents in the index, sorted
    pub files_indexed: Vec<String>,
}

/// What `refresh_index` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Persisted index matched the corpus and was loaded
    Loaded { chunks: usize },

    /// Index was rebuilt from the corpus and persisted
    Rebuilt { chunks: usize, sources: usize },

    /// Corpus has no indexable content
    Empty,
}

impl RefreshOutcome {
    pub fn chunk_count(&self) -> usize {
        match self {
            Self::Loaded { chunks } | Self::Rebuilt { chunks, .. } => *chunks,
            Self::Empty => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_normalizes_text() {
        let chunk = Chunk::new("tuition.txt", 0, "Computer Engineering tuition is 55,000 MAD");
        assert_eq!(chunk.normalized_text, "computer engineering tuition is 55,000 mad");
        assert_eq!(chunk.source, "tuition.txt");
    }

    #[test]
    fn test_refresh_outcome_serialization() {
        let json = serde_json::to_value(RefreshOutcome::Rebuilt { chunks: 4, sources: 2 }).unwrap();
        assert_eq!(json["outcome"], "rebuilt");
        assert_eq!(json["chunks"], 4);
        assert_eq!(RefreshOutcome::Empty.chunk_count(), 0);
    }
}
