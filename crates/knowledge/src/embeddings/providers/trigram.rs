//! Offline embedding provider built from hashed words and character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use agora_core::AppResult;
use std::collections::BTreeMap;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "with", "from", "this", "that", "have", "has",
    "had", "its", "their", "they", "them", "which", "but", "les", "des", "une", "est", "pour",
];

/// Deterministic, content-aware embeddings for local operation.
///
/// Each word contributes to one bucket for the whole word and one bucket per
/// character trigram, and the result is scaled to unit length. Shared
/// vocabulary therefore means a smaller Euclidean distance.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, token: &str, multiplier: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut frequencies: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *frequencies.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &frequencies {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 37)] += (*freq as f32).sqrt();
            }
            embedding[self.bucket(word, 31)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    fn distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[tokio::test]
    async fn test_unit_length_and_dimensions() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("Tuition for computer engineering").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("frais de scolarité").await.unwrap();
        let b = provider.embed("frais de scolarité").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed("engineering tuition").await.unwrap();
        let related = provider.embed("Computer engineering tuition is 55,000 MAD").await.unwrap();
        let unrelated = provider.embed("Campus gym opens at dawn").await.unwrap();
        assert!(distance(&query, &related) < distance(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let provider = TrigramProvider::new(128);
        let texts = vec!["housing".to_string(), "scholarship".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], provider.embed("housing").await.unwrap());
        assert_eq!(batch[1], provider.embed("scholarship").await.unwrap());
    }
}
