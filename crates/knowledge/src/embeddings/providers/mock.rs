//! Scripted embedding provider for tests.

use crate::embeddings::provider::EmbeddingProvider;
use crate::embeddings::providers::trigram::TrigramProvider;
use grounded_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Provider whose behavior tests can script.
///
/// Texts registered with [`MockProvider::with_vector`] embed to exactly the
/// given vector; any other text falls back to trigram embeddings. Failure,
/// latency and malformed output can be switched on at runtime, so a test can
/// break a rebuild midway through a session.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
    fallback: TrigramProvider,
    failing: AtomicBool,
    malformed: AtomicBool,
    delay_ms: AtomicU64,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: HashMap::new(),
            fallback: TrigramProvider::new(dimensions),
            failing: AtomicBool::new(false),
            malformed: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Register a fixed vector for `text`.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Make every following call fail with an embedding error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every following call return one vector too few.
    pub fn set_malformed(&self, malformed: bool) {
        self.malformed.store(malformed, Ordering::SeqCst);
    }

    /// Sleep this long inside every following call.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `embed_batch` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text embedded so far, in call order.
    pub fn seen_texts(&self) -> Vec<String> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.extend(texts.iter().cloned());
        }

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("mock provider failure".to_string()));
        }

        let mut vectors: Vec<Vec<f32>> = texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| self.fallback.embed_text(text))
            })
            .collect();

        if self.malformed.load(Ordering::SeqCst) {
            vectors.pop();
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_vectors_returned_verbatim() {
        let provider = MockProvider::new(3).with_vector("north", vec![0.0, 2.0, 0.0]);

        let vectors = provider
            .embed_batch(&["north".to_string(), "somewhere else".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors[0], vec![0.0, 2.0, 0.0]);
        assert_eq!(vectors[1].len(), 3);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.seen_texts(), vec!["north", "somewhere else"]);
    }

    #[tokio::test]
    async fn test_failure_switch() {
        let provider = MockProvider::new(3);
        provider.set_failing(true);
        assert!(matches!(
            provider.embed("x").await,
            Err(AppError::Embedding(_))
        ));

        provider.set_failing(false);
        assert!(provider.embed("x").await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_drops_a_vector() {
        let provider = MockProvider::new(3);
        provider.set_malformed(true);

        let vectors = provider
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
    }
}
