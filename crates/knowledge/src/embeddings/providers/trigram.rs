//! Offline embedding provider built from hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use grounded_core::AppResult;
use std::collections::HashMap;

/// Words too common to carry meaning.
const STOP_WORDS: [&str; 32] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Deterministic, content-aware embeddings for local and offline use.
///
/// Each word (lower-cased, punctuation stripped, stop words dropped) adds
/// weight to the buckets of its character trigrams and of the whole word.
/// Not semantically accurate like a neural model, but texts that share
/// vocabulary land close together, which is enough to ground answers over a
/// small knowledge file without any network access.
#[derive(Debug, Clone)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Embed one text. Text without usable words maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let lower = text.to_lowercase();
        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let bucket = self.bucket(window.iter().copied(), 37);
                // sqrt damping keeps repeated words from dominating
                embedding[bucket] += (*freq as f32).sqrt();
            }

            let bucket = self.bucket(word.chars(), 31);
            embedding[bucket] += *freq as f32;
        }

        embedding
    }

    fn bucket(&self, chars: impl Iterator<Item = char>, multiplier: u64) -> usize {
        let hash = chars.fold(0u64, |acc, c| {
            acc.wrapping_mul(multiplier).wrapping_add(c as u64)
        });
        (hash % self.dimensions as u64) as usize
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

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[tokio::test]
    async fn test_trigram_provider_identity() {
        let provider = TrigramProvider::new(384);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_batch() {
        let provider = TrigramProvider::new(384);
        let texts = vec![
            "hello world".to_string(),
            "test embedding".to_string(),
            "rust programming".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
            assert!(embedding.iter().any(|&x| x > 0.0));
        }
    }

    #[test]
    fn test_trigram_provider_deterministic() {
        let provider = TrigramProvider::new(384);
        assert_eq!(
            provider.embed_text("deterministic test"),
            provider.embed_text("deterministic test")
        );
        assert_ne!(
            provider.embed_text("hello world"),
            provider.embed_text("goodbye world")
        );
    }

    #[test]
    fn test_punctuation_and_case_ignored() {
        let provider = TrigramProvider::new(384);
        assert_eq!(
            provider.embed_text("Are dogs mammals?"),
            provider.embed_text("dogs MAMMALS.")
        );
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed_text("Are dogs mammals?");
        let cats = provider.embed_text("Cats are mammals.");
        let dogs = provider.embed_text("Dogs are mammals too.");

        assert!(cosine(&query, &dogs) > cosine(&query, &cats));
    }

    #[test]
    fn test_trigram_provider_empty_text() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed_text("");

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));

        // Only stop words and short tokens
        assert!(provider.embed_text("it is a ox").iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_trigram_provider_utf8_safety() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed_text("Gamedex é um aplicativo 🎮 brasileiro para gerenciar jogos!");

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().any(|&x| x > 0.0));
    }
}
