//! On-disk persistence of the built index.
//!
//! Two files live in the index directory:
//! - `vectors.bin`: the serialized [`FlatL2Index`]
//! - `metadata.json`: corpus fingerprint, embedding model and chunk list
//!
//! Each file is written to a temporary sibling and renamed into place.

use crate::types::Chunk;
use crate::vector_index::{FlatL2Index, VectorIndex};
use agora_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const VECTORS_FILE: &str = "vectors.bin";
const METADATA_FILE: &str = "metadata.json";

/// A complete, self-consistent index.
#[derive(Debug, Clone)]
pub struct PersistedIndex {
    pub fingerprint: String,
    pub embedding_model: String,
    pub chunks: Vec<Chunk>,
    pub vectors: FlatL2Index,
}

#[derive(Serialize, Deserialize)]
struct Metadata {
    fingerprint: String,
    embedding_model: String,
    chunks: Vec<Chunk>,
}

/// Reads and writes [`PersistedIndex`] files.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the persisted index, or `None` when nothing has been saved.
    pub fn load(&self) -> AppResult<Option<PersistedIndex>> {
        let metadata_path = self.dir.join(METADATA_FILE);
        let vectors_path = self.dir.join(VECTORS_FILE);
        if !metadata_path.exists() || !vectors_path.exists() {
            return Ok(None);
        }

        let metadata: Metadata = serde_json::from_slice(&std::fs::read(&metadata_path)?)?;
        let vectors = FlatL2Index::from_bytes(&std::fs::read(&vectors_path)?)?;

        if vectors.len() != metadata.chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Persisted index is inconsistent: {} vectors for {} chunks",
                vectors.len(),
                metadata.chunks.len()
            )));
        }

        Ok(Some(PersistedIndex {
            fingerprint: metadata.fingerprint,
            embedding_model: metadata.embedding_model,
            chunks: metadata.chunks,
            vectors,
        }))
    }

    /// Persist the index, replacing any previous one.
    pub fn save(&self, index: &PersistedIndex) -> AppResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let metadata = serde_json::to_vec(&Metadata {
            fingerprint: index.fingerprint.clone(),
            embedding_model: index.embedding_model.clone(),
            chunks: index.chunks.clone(),
        })?;

        write_atomic(&self.dir.join(VECTORS_FILE), &index.vectors.to_bytes())?;
        write_atomic(&self.dir.join(METADATA_FILE), &metadata)?;

        tracing::debug!("Persisted {} chunks to {:?}", index.chunks.len(), self.dir);
        Ok(())
    }

    /// Remove persisted files so the next refresh starts from scratch.
    pub fn clear(&self) -> AppResult<()> {
        for name in [METADATA_FILE, VECTORS_FILE] {
            let path = self.dir.join(name);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> PersistedIndex {
        PersistedIndex {
            fingerprint: "abc123".to_string(),
            embedding_model: "trigram:trigram-v1:2".to_string(),
            chunks: vec![
                Chunk::new("fees.txt", 0, "Tuition: 55,000 MAD"),
                Chunk::new("fees.txt", 1, "Registration: 5,000 MAD"),
            ],
            vectors: FlatL2Index::build(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap(),
        }
    }

    #[test]
    fn test_load_without_files() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path().join("index"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path().join("index"));
        store.save(&sample()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.fingerprint, "abc123");
        assert_eq!(loaded.chunks, sample().chunks);
        assert_eq!(loaded.vectors, sample().vectors);
        assert!(!store.dir().join("metadata.tmp").exists());
    }

    #[test]
    fn test_inconsistent_files_rejected() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let mut index = sample();
        index.chunks.pop();
        store.save(&index).unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
