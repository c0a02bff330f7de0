//! Retrieval engine: corpus indexing and hybrid search.
//!
//! The engine owns one immutable index snapshot. Searches clone the
//! snapshot handle and never block on a rebuild; rebuilds are serialized and
//! install a complete snapshot only after it has been persisted.

use crate::chunk::DocumentChunker;
use crate::corpus::{fingerprint_entries, Corpus, DirectoryCorpus};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::ranking::rank;
use crate::store::{IndexStore, PersistedIndex};
use crate::types::{Chunk, IndexStatus, RefreshOutcome, ScoredChunk};
use crate::vector_index::{FlatL2Index, VectorIndex};
use agora_core::config::KnowledgeSettings;
use agora_core::{AppConfig, AppError, AppResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Tunables for indexing and search.
#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Nearest neighbours fetched before re-scoring, independent of `top_k`
    pub candidate_pool: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self::from(&KnowledgeSettings::default())
    }
}

impl From<&KnowledgeSettings> for RetrievalOptions {
    fn from(settings: &KnowledgeSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            candidate_pool: settings.candidate_pool,
        }
    }
}

pub struct RetrievalEngine {
    corpus: Arc<dyn Corpus>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: IndexStore,
    chunker: DocumentChunker,
    candidate_pool: usize,
    snapshot: RwLock<Option<Arc<PersistedIndex>>>,
    rebuild_lock: Mutex<()>,
}

impl RetrievalEngine {
    /// Construct an engine with no index loaded. Call [`warm_up`](Self::warm_up)
    /// before serving searches.
    pub fn new(
        corpus: Arc<dyn Corpus>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: IndexStore,
        options: RetrievalOptions,
    ) -> AppResult<Self> {
        if options.candidate_pool == 0 {
            return Err(AppError::Config(
                "candidate pool must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            corpus,
            embedder,
            store,
            chunker: DocumentChunker::new(options.chunk_size, options.chunk_overlap)?,
            candidate_pool: options.candidate_pool,
            snapshot: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Build an engine over the configured corpus directory and index directory.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedder = create_provider(&config.knowledge.embedding)?;
        Self::new(
            Arc::new(DirectoryCorpus::new(config.corpus_dir())),
            embedder,
            IndexStore::new(config.index_dir()),
            RetrievalOptions::from(&config.knowledge),
        )
    }

    /// Load the persisted index or build it if the corpus changed.
    pub async fn warm_up(&self) -> AppResult<RefreshOutcome> {
        self.refresh_index(false).await
    }

    /// Bring the index in line with the corpus.
    ///
    /// Without `force`, a snapshot (in memory or on disk) whose fingerprint
    /// and embedding model match the live corpus is reused as is. Otherwise
    /// the corpus is re-chunked and re-embedded. On failure the previous
    /// snapshot stays in place and nothing is persisted.
    pub async fn refresh_index(&self, force: bool) -> AppResult<RefreshOutcome> {
        let _guard = self.rebuild_lock.lock().await;

        if self.corpus.ensure_exists()? {
            self.install(None).await;
            return Ok(RefreshOutcome::Empty);
        }

        let entries = self.corpus.entries()?;
        let fingerprint = fingerprint_entries(&entries);
        let model_key = self.embedder.model_key();

        if !force {
            if let Some(current) = self.snapshot.read().await.clone() {
                if current.fingerprint == fingerprint && current.embedding_model == model_key {
                    tracing::debug!("In-memory index is current");
                    return Ok(RefreshOutcome::Loaded {
                        chunks: current.chunks.len(),
                    });
                }
            }

            match self.store.load() {
                Ok(Some(persisted))
                    if persisted.fingerprint == fingerprint
                        && persisted.embedding_model == model_key =>
                {
                    let chunks = persisted.chunks.len();
                    tracing::info!("Loaded cached index ({} chunks)", chunks);
                    self.install(Some(persisted)).await;
                    return Ok(RefreshOutcome::Loaded { chunks });
                }
                Ok(Some(_)) => tracing::info!("Corpus or embedding model changed"),
                Ok(None) => tracing::debug!("No persisted index in {:?}", self.store.dir()),
                Err(e) => tracing::warn!("Ignoring unreadable persisted index: {}", e),
            }
        }

        if entries.is_empty() {
            tracing::info!("Corpus is empty, no index built");
            self.install(None).await;
            if let Err(e) = self.store.clear() {
                tracing::warn!("Failed to clear stale index files: {}", e);
            }
            return Ok(RefreshOutcome::Empty);
        }

        tracing::info!("Rebuilding index from {} documents", entries.len());

        let mut chunks: Vec<Chunk> = Vec::new();
        for entry in &entries {
            match self.corpus.read(&entry.name) {
                Ok(text) if text.trim().is_empty() => {
                    tracing::debug!("Skipping empty document {}", entry.name);
                }
                Ok(text) => chunks.extend(self.chunker.split(&entry.name, &text)),
                Err(e) => tracing::warn!("Skipping {}: {}", entry.name, e),
            }
        }

        if chunks.is_empty() {
            tracing::info!("No readable content in corpus, no index built");
            self.install(None).await;
            if let Err(e) = self.store.clear() {
                tracing::warn!("Failed to clear stale index files: {}", e);
            }
            return Ok(RefreshOutcome::Empty);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let persisted = PersistedIndex {
            fingerprint,
            embedding_model: model_key,
            vectors: FlatL2Index::build(&vectors)?,
            chunks,
        };
        self.store.save(&persisted)?;

        let outcome = RefreshOutcome::Rebuilt {
            chunks: persisted.chunks.len(),
            sources: source_names(&persisted.chunks).len(),
        };
        tracing::info!("Index rebuilt: {:?}", outcome);
        self.install(Some(persisted)).await;

        Ok(outcome)
    }

    async fn install(&self, index: Option<PersistedIndex>) {
        *self.snapshot.write().await = index.map(Arc::new);
    }

    /// Top `top_k` chunks for a query. Empty when no index is built.
    pub async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<Chunk>> {
        Ok(self
            .search_scored(query, top_k)
            .await?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }

    /// Like [`search`](Self::search) but keeps the scores.
    pub async fn search_scored(&self, query: &str, top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        let Some(snapshot) = self.snapshot.read().await.clone() else {
            tracing::debug!("Search before any index was built");
            return Ok(Vec::new());
        };
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let candidates = snapshot
            .vectors
            .search(&query_vector, self.candidate_pool)?
            .into_iter()
            .filter_map(|(position, distance)| {
                snapshot.chunks.get(position).map(|c| (c.clone(), distance))
            })
            .collect();

        let ranked = rank(query, candidates, top_k);
        tracing::debug!("Search returned {} chunks", ranked.len());
        Ok(ranked)
    }

    pub async fn status(&self) -> IndexStatus {
        match self.snapshot.read().await.as_ref() {
            Some(snapshot) => IndexStatus {
                ready: !snapshot.chunks.is_empty(),
                chunk_count: snapshot.chunks.len(),
                files_indexed: source_names(&snapshot.chunks),
            },
            None => IndexStatus::default(),
        }
    }
}

fn source_names(chunks: &[Chunk]) -> Vec<String> {
    chunks
        .iter()
        .map(|c| c.source.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
