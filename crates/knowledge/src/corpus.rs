//! Corpus enumeration and fingerprinting.

use agora_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Fingerprint of a corpus with no eligible documents.
pub const EMPTY_FINGERPRINT: &str = "empty";

/// A document as seen by the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub name: String,
    pub size: u64,
}

/// Source of indexable documents.
pub trait Corpus: Send + Sync {
    /// Eligible documents, sorted by name.
    fn entries(&self) -> AppResult<Vec<CorpusEntry>>;

    /// Read a document as UTF-8.
    fn read(&self, name: &str) -> AppResult<String>;

    /// Make sure the corpus exists. Returns `true` when it had to be created.
    fn ensure_exists(&self) -> AppResult<bool>;

    /// Hash of the sorted `name_size` list. Any addition, removal, rename or
    /// size change yields a different value.
    fn fingerprint(&self) -> AppResult<String> {
        Ok(fingerprint_entries(&self.entries()?))
    }
}

/// Compute the fingerprint for an already-enumerated corpus.
pub fn fingerprint_entries(entries: &[CorpusEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_FINGERPRINT.to_string();
    }

    let mut hasher = Sha256::new();
    for entry in entries {
        hasher.update(format!("{}_{}|", entry.name, entry.size).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Corpus backed by the `.txt` files at the top level of a directory.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
}

impl DirectoryCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn is_eligible(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
    }
}

impl Corpus for DirectoryCorpus {
    fn entries(&self) -> AppResult<Vec<CorpusEntry>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !Self::is_eligible(path) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::warn!("Skipping {:?}: cannot read metadata: {}", path, e);
                    continue;
                }
            };

            entries.push(CorpusEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size,
            });
        }

        Ok(entries)
    }

    fn read(&self, name: &str) -> AppResult<String> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))
    }

    fn ensure_exists(&self) -> AppResult<bool> {
        if self.root.is_dir() {
            return Ok(false);
        }
        std::fs::create_dir_all(&self.root)?;
        tracing::info!("Created corpus directory {:?}", self.root);
        Ok(true)
    }
}
