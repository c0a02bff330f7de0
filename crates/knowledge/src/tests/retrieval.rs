use crate::corpus::DirectoryCorpus;
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::retrieval::{RetrievalEngine, RetrievalOptions};
use crate::store::IndexStore;
use crate::types::RefreshOutcome;
use agora_core::{AppError, AppResult};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Trigram embeddings that count batch calls and can be told to fail.
#[derive(Debug)]
struct InstrumentedProvider {
    inner: TrigramProvider,
    batches: AtomicUsize,
    fail: AtomicBool,
}

impl InstrumentedProvider {
    fn new(dimensions: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: TrigramProvider::new(dimensions),
            batches: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for InstrumentedProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Knowledge("embedding backend offline".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("knowledge_base")).unwrap();
        Self { temp }
    }

    fn corpus_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("knowledge_base")
    }

    fn write(&self, name: &str, content: &str) {
        std::fs::write(self.corpus_dir().join(name), content).unwrap();
    }

    fn engine(&self, provider: Arc<InstrumentedProvider>) -> RetrievalEngine {
        engine_at(&self.corpus_dir(), &self.temp.path().join("index"), provider)
    }
}

fn engine_at(corpus: &Path, index: &Path, provider: Arc<InstrumentedProvider>) -> RetrievalEngine {
    RetrievalEngine::new(
        Arc::new(DirectoryCorpus::new(corpus)),
        provider,
        IndexStore::new(index),
        RetrievalOptions::default(),
    )
    .unwrap()
}

fn university_corpus(fixture: &Fixture) {
    fixture.write("tuition.txt", "Computer Engineering tuition is 55,000 MAD");
    fixture.write("housing.txt", "On-campus housing offers 150 spots for 600 students.");
    fixture.write("jobs.txt", "Placement partnerships cover Fes-Meknes employers.");
    fixture.write("scholarships.txt", "Merit scholarships require an average above 12/20.");
}

#[tokio::test]
async fn test_empty_corpus_creates_directory_and_returns_nothing() {
    let temp = TempDir::new().unwrap();
    let corpus_dir = temp.path().join("knowledge_base");
    let engine = engine_at(&corpus_dir, &temp.path().join("index"), InstrumentedProvider::new(64));

    assert_eq!(engine.warm_up().await.unwrap(), RefreshOutcome::Empty);
    assert!(corpus_dir.is_dir());
    assert!(engine.search("anything", 5).await.unwrap().is_empty());

    let status = engine.status().await;
    assert!(!status.ready);
    assert_eq!(status.chunk_count, 0);
}

#[tokio::test]
async fn test_unchanged_corpus_never_re_embeds() {
    let fixture = Fixture::new();
    university_corpus(&fixture);

    let provider = InstrumentedProvider::new(64);
    let engine = fixture.engine(provider.clone());

    let first = engine.refresh_index(false).await.unwrap();
    assert_eq!(first, RefreshOutcome::Rebuilt { chunks: 4, sources: 4 });
    assert_eq!(provider.batches(), 1);

    let second = engine.refresh_index(false).await.unwrap();
    assert_eq!(second, RefreshOutcome::Loaded { chunks: 4 });
    assert_eq!(provider.batches(), 1);

    // A fresh process loads the persisted index instead of embedding.
    let reloaded_provider = InstrumentedProvider::new(64);
    let reloaded = fixture.engine(reloaded_provider.clone());
    assert_eq!(reloaded.warm_up().await.unwrap(), RefreshOutcome::Loaded { chunks: 4 });
    assert_eq!(reloaded_provider.batches(), 0);
    assert_eq!(reloaded.status().await, engine.status().await);
}

#[tokio::test]
async fn test_corpus_changes_force_rebuild() {
    let fixture = Fixture::new();
    university_corpus(&fixture);

    let provider = InstrumentedProvider::new(64);
    let engine = fixture.engine(provider.clone());
    engine.warm_up().await.unwrap();

    fixture.write("tuition.txt", "Computer Engineering tuition is 55,000 MAD plus a 5,000 MAD lab fee");
    assert!(matches!(
        engine.refresh_index(false).await.unwrap(),
        RefreshOutcome::Rebuilt { .. }
    ));

    fixture.write("abroad.txt", "Mobility grants fund exchange semesters.");
    assert_eq!(
        engine.refresh_index(false).await.unwrap(),
        RefreshOutcome::Rebuilt { chunks: 5, sources: 5 }
    );

    std::fs::remove_file(fixture.corpus_dir().join("jobs.txt")).unwrap();
    assert_eq!(
        engine.refresh_index(false).await.unwrap(),
        RefreshOutcome::Rebuilt { chunks: 4, sources: 4 }
    );
    assert_eq!(provider.batches(), 4);
}

#[tokio::test]
async fn test_force_rebuild_re_embeds() {
    let fixture = Fixture::new();
    university_corpus(&fixture);

    let provider = InstrumentedProvider::new(64);
    let engine = fixture.engine(provider.clone());
    engine.warm_up().await.unwrap();
    engine.refresh_index(true).await.unwrap();
    assert_eq!(provider.batches(), 2);
}

#[tokio::test]
async fn test_embedding_model_change_invalidates_cache() {
    let fixture = Fixture::new();
    university_corpus(&fixture);

    fixture.engine(InstrumentedProvider::new(64)).warm_up().await.unwrap();

    let wider = fixture.engine(InstrumentedProvider::new(128));
    assert!(matches!(wider.warm_up().await.unwrap(), RefreshOutcome::Rebuilt { .. }));
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_index() {
    let fixture = Fixture::new();
    university_corpus(&fixture);

    let provider = InstrumentedProvider::new(64);
    let engine = fixture.engine(provider.clone());
    engine.warm_up().await.unwrap();
    let before = engine.status().await;

    fixture.write("abroad.txt", "Double degree tracks are restricted.");
    provider.fail.store(true, Ordering::SeqCst);
    assert!(engine.refresh_index(false).await.is_err());
    provider.fail.store(false, Ordering::SeqCst);

    assert_eq!(engine.status().await, before);
    let persisted = IndexStore::new(fixture.temp.path().join("index"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(persisted.chunks.len(), before.chunk_count);
}

#[tokio::test]
async fn test_unreadable_and_blank_files_are_skipped() {
    let fixture = Fixture::new();
    fixture.write("tuition.txt", "Computer Engineering tuition is 55,000 MAD");
    fixture.write("blank.txt", "   \n");
    std::fs::write(fixture.corpus_dir().join("binary.txt"), [0xff, 0xfe, 0xfd]).unwrap();

    let engine = fixture.engine(InstrumentedProvider::new(64));
    assert_eq!(
        engine.warm_up().await.unwrap(),
        RefreshOutcome::Rebuilt { chunks: 1, sources: 1 }
    );
}

#[tokio::test]
async fn test_blanked_corpus_clears_persisted_index() {
    let fixture = Fixture::new();
    fixture.write("tuition.txt", "Computer Engineering tuition is 55,000 MAD");

    let engine = fixture.engine(InstrumentedProvider::new(64));
    engine.warm_up().await.unwrap();
    let store = IndexStore::new(fixture.temp.path().join("index"));
    assert!(store.load().unwrap().is_some());

    fixture.write("tuition.txt", "   \n");
    assert_eq!(engine.refresh_index(false).await.unwrap(), RefreshOutcome::Empty);
    assert!(store.load().unwrap().is_none());
    assert_eq!(engine.status().await.chunk_count, 0);

    // A fresh engine must not resurrect the old index from disk
    let reopened = fixture.engine(InstrumentedProvider::new(64));
    assert_eq!(reopened.warm_up().await.unwrap(), RefreshOutcome::Empty);
}

#[tokio::test]
async fn test_tuition_query_finds_tuition_chunk() {
    let fixture = Fixture::new();
    university_corpus(&fixture);

    let engine = fixture.engine(InstrumentedProvider::new(384));
    engine.warm_up().await.unwrap();

    let results = engine
        .search("how much does computer engineering tuition cost", 5)
        .await
        .unwrap();
    assert_eq!(results[0].source, "tuition.txt");
    assert!(results[0].text.contains("55,000 MAD"));
}

#[tokio::test]
async fn test_larger_top_k_extends_smaller() {
    let fixture = Fixture::new();
    university_corpus(&fixture);
    fixture.write("abroad.txt", "Exchange programs need a visa.");
    fixture.write("campus.txt", "The gym is open during off-peak hours.");
    fixture.write("fees.txt", "Hidden fees include an AI lab fee.");

    let engine = fixture.engine(InstrumentedProvider::new(128));
    engine.warm_up().await.unwrap();

    let small = engine.search("engineering fees housing", 3).await.unwrap();
    let large = engine.search("engineering fees housing", 6).await.unwrap();
    assert_eq!(small.len(), 3);
    assert_eq!(large.len(), 6);
    assert_eq!(&large[..3], &small[..]);
}

#[tokio::test]
async fn test_boosted_chunks_outrank_unboosted() {
    let fixture = Fixture::new();
    university_corpus(&fixture);

    let engine = fixture.engine(InstrumentedProvider::new(64));
    engine.warm_up().await.unwrap();

    let scored = engine.search_scored("scholarships merit average", 4).await.unwrap();
    assert_eq!(scored[0].chunk.source, "scholarships.txt");
    assert!(scored[0].boost_matches >= 2);
    for pair in scored.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
}
