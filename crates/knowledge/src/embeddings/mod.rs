//! Embedding gateway.
//!
//! Wraps a pluggable provider behind a stable batch interface that checks
//! provider output, enforces a deadline and L2-normalizes every vector.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use grounded_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Scale `vector` to unit length in place. Zero vectors stay zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Stable embedding interface used by the knowledge store and retriever.
#[derive(Debug, Clone)]
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    timeout: Duration,
}

impl EmbeddingGateway {
    /// Wrap `provider` with the batch size and deadline from `config`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            batch_size: config.batch_size.max(1),
            timeout: config.timeout,
        }
    }

    /// Build the configured provider and wrap it.
    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        let provider = create_provider(config)?;
        Ok(Self::new(provider, config))
    }

    /// Replace the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Encode `texts` into unit vectors, one per text, in input order.
    ///
    /// Provider failures and malformed output become `AppError::Embedding`;
    /// a call exceeding the deadline becomes `AppError::Timeout`. Nothing is
    /// retried.
    pub async fn encode(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Embedding {} texts with provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let mut batch_vectors = self.call_provider(batch).await?;
            for vector in &mut batch_vectors {
                l2_normalize(vector);
            }
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }

    /// Encode a single text into a unit vector.
    pub async fn encode_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.encode(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("Provider returned no vector".to_string()))
    }

    async fn call_provider(&self, batch: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let vectors = tokio::time::timeout(self.timeout, self.provider.embed_batch(batch))
            .await
            .map_err(|_| AppError::timeout(self.timeout, "embedding provider call"))?
            .map_err(|e| match e {
                AppError::Embedding(_) | AppError::Timeout(..) => e,
                other => AppError::Embedding(other.to_string()),
            })?;

        if vectors.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }

        let dimensions = self.provider.dimensions();
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::Embedding(format!(
                    "Vector {} has {} dimensions, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(AppError::Embedding(format!(
                    "Vector {} contains non-finite values",
                    i
                )));
            }
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;

    fn gateway(provider: MockProvider) -> (Arc<MockProvider>, EmbeddingGateway) {
        let provider = Arc::new(provider);
        let gateway = EmbeddingGateway::new(provider.clone(), &EmbeddingConfig::default());
        (provider, gateway)
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.6, 0.8]);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_encode_normalizes_and_preserves_order() {
        let (_, gateway) = gateway(
            MockProvider::new(2)
                .with_vector("a", vec![10.0, 0.0])
                .with_vector("b", vec![0.0, 0.5]),
        );

        let vectors = gateway
            .encode(&["b".to_string(), "a".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_encode_batches_by_batch_size() {
        let provider = Arc::new(MockProvider::new(8));
        let config = EmbeddingConfig {
            batch_size: 2,
            ..Default::default()
        };
        let gateway = EmbeddingGateway::new(provider.clone(), &config);

        let texts: Vec<String> = (0..5).map(|i| format!("text number {}", i)).collect();
        let vectors = gateway.encode(&texts).await.unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(provider.call_count(), 3);
        for v in vectors.iter().filter(|v| v.iter().any(|x| *x != 0.0)) {
            assert!((norm(v) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn test_encode_empty_input_skips_provider() {
        let (provider, gateway) = gateway(MockProvider::new(4));
        assert!(gateway.encode(&[]).await.unwrap().is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_embedding_error() {
        let (provider, gateway) = gateway(MockProvider::new(4));
        provider.set_failing(true);

        let result = gateway.encode_one("anything").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
        // Not retried
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_vector_count_is_embedding_error() {
        let (provider, gateway) = gateway(MockProvider::new(4));
        provider.set_malformed(true);

        let result = gateway
            .encode(&["one".to_string(), "two".to_string()])
            .await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_wrong_dimensions_is_embedding_error() {
        let (_, gateway) = gateway(MockProvider::new(4).with_vector("short", vec![1.0, 0.0]));

        let result = gateway.encode_one("short").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_non_finite_values_rejected() {
        let (_, gateway) = gateway(MockProvider::new(2).with_vector("nan", vec![f32::NAN, 1.0]));

        let result = gateway.encode_one("nan").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let (provider, gateway) = gateway(MockProvider::new(4));
        provider.set_delay(Duration::from_millis(500));
        let gateway = gateway.with_timeout(Duration::from_millis(20));

        let result = gateway.encode_one("slow").await;
        assert!(matches!(result, Err(AppError::Timeout(..))));
    }

    #[tokio::test]
    async fn test_from_config_uses_trigram() {
        let gateway = EmbeddingGateway::from_config(&EmbeddingConfig::default()).unwrap();
        assert_eq!(gateway.provider_name(), "trigram");
        assert_eq!(gateway.dimensions(), 384);

        let vector = gateway.encode_one("grounded retrieval").await.unwrap();
        assert!((norm(&vector) - 1.0).abs() < 1e-5);
    }
}
