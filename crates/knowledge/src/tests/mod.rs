//! Cross-module tests for the retrieval pipeline.


use crate::chunker::{ChunkConfig, Chunker};
use crate::embeddings::providers::MockProvider;
use crate::embeddings::{EmbeddingConfig, EmbeddingGateway};
use crate::store::KnowledgeStore;
use std::sync::Arc;

pub(crate) const CORPUS: &str = "Cats are mammals.\n\nDogs are mammals too.";

/// In-memory store over a scriptable provider.
pub(crate) fn mock_store(dimensions: usize) -> (Arc<MockProvider>, Arc<KnowledgeStore>) {
    let provider = Arc::new(MockProvider::new(dimensions));
    let gateway = EmbeddingGateway::new(provider.clone(), &EmbeddingConfig::default());
    let chunker = Chunker::new(ChunkConfig::default()).unwrap();
    (provider, Arc::new(KnowledgeStore::in_memory(chunker, gateway)))
}
