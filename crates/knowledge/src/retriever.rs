//! Query-time retrieval over a knowledge snapshot.

use crate::chunker::Chunk;
use crate::embeddings::EmbeddingGateway;
use crate::snapshot::KnowledgeSnapshot;
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A retrieved chunk and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Chunks most relevant to a query, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Version of the snapshot every chunk came from
    pub snapshot_version: u64,

    pub chunks: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn empty(snapshot_version: u64) -> Self {
        Self {
            snapshot_version,
            chunks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Chunk texts in result order.
    pub fn texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.chunk.text.as_str()).collect()
    }

    pub fn top_score(&self) -> Option<f32> {
        self.chunks.first().map(|c| c.score)
    }
}

/// Embeds queries and searches a snapshot's index.
#[derive(Debug, Clone)]
pub struct Retriever {
    gateway: EmbeddingGateway,
    min_score: Option<f32>,
}

impl Retriever {
    pub fn new(gateway: EmbeddingGateway) -> Self {
        Self {
            gateway,
            min_score: None,
        }
    }

    /// Drop hits scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn gateway(&self) -> &EmbeddingGateway {
        &self.gateway
    }

    /// Return up to `top_k` chunks of `snapshot` most similar to `query`.
    ///
    /// A blank query or `top_k == 0` is rejected. An empty snapshot yields
    /// an empty result without calling the embedding provider.
    pub async fn retrieve(
        &self,
        snapshot: &KnowledgeSnapshot,
        query: &str,
        top_k: usize,
    ) -> AppResult<RetrievalResult> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Query must not be empty".to_string(),
            ));
        }

        if top_k == 0 {
            return Err(AppError::InvalidArgument(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if snapshot.is_empty() {
            tracing::debug!("Snapshot v{} is empty, nothing to retrieve", snapshot.version());
            return Ok(RetrievalResult::empty(snapshot.version()));
        }

        let query_vector = self.gateway.encode_one(query).await?;
        let hits = snapshot.index().search(&query_vector, top_k)?;

        let mut chunks = Vec::with_capacity(hits.len());
        for hit in hits {
            if self.min_score.is_some_and(|floor| hit.score < floor) {
                continue;
            }

            let chunk = snapshot
                .index()
                .chunk_id(hit.position)
                .and_then(|id| snapshot.chunk(id))
                .ok_or_else(|| {
                    AppError::Knowledge(format!(
                        "Index position {} has no chunk in snapshot v{}",
                        hit.position,
                        snapshot.version()
                    ))
                })?;

            chunks.push(RetrievedChunk {
                chunk: chunk.clone(),
                score: hit.score,
            });
        }

        match chunks.first() {
            Some(top) => tracing::debug!(
                "Retrieved {} chunks from snapshot v{} (top score: {:.3})",
                chunks.len(),
                snapshot.version(),
                top.score
            ),
            None => tracing::debug!(
                "No chunks above the score floor in snapshot v{}",
                snapshot.version()
            ),
        }

        Ok(RetrievalResult {
            snapshot_version: snapshot.version(),
            chunks,
        })
    }
}
