//! Embedding provider trait and factory.

use super::providers::{OllamaProvider, TrigramProvider};
use agora_core::config::EmbeddingSettings;
use agora_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Implementations must be deterministic: the same text always maps to the
/// same vector, and every vector has `dimensions()` entries.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }

    /// Identifier persisted with the index; a change invalidates the cache.
    fn model_key(&self) -> String {
        format!("{}:{}:{}", self.provider_name(), self.model_name(), self.dimensions())
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    if settings.dimensions == 0 {
        return Err(AppError::Config(
            "Embedding dimensions must be greater than 0".to_string(),
        ));
    }

    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(settings.dimensions))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(
            settings.endpoint.as_deref(),
            &settings.model,
            settings.dimensions,
        )?)),

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            settings.provider
        ))),
    }
}
