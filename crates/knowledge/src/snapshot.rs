//! Versioned knowledge snapshots.

use crate::chunker::{Chunk, Chunker};
use crate::embeddings::EmbeddingGateway;
use crate::vector_index::{IndexEntry, VectorIndex};
use chrono::{DateTime, Utc};
use grounded_core::AppResult;
use sha2::{Digest, Sha256};
use std::time::Instant;

/// The complete chunk sequence and index for one knowledge-base state.
///
/// Snapshots are built in full and never mutated; an update produces a new
/// snapshot that replaces the old one as a whole.
#[derive(Debug, Clone)]
pub struct KnowledgeSnapshot {
    version: u64,
    source: String,
    source_sha256: String,
    chunks: Vec<Chunk>,
    index: VectorIndex,
    built_at: DateTime<Utc>,
}

impl KnowledgeSnapshot {
    /// An empty snapshot with version 0.
    pub fn empty(dimensions: usize) -> Self {
        Self {
            version: 0,
            source: String::new(),
            source_sha256: sha256_hex(""),
            chunks: Vec::new(),
            index: VectorIndex::empty(dimensions),
            built_at: Utc::now(),
        }
    }

    /// Chunk, embed and index `source`.
    ///
    /// Either every step succeeds and a complete snapshot is returned, or the
    /// first error is returned and nothing is built.
    pub async fn build(
        version: u64,
        source: String,
        chunker: &Chunker,
        gateway: &EmbeddingGateway,
    ) -> AppResult<Self> {
        let start = Instant::now();

        let chunks = chunker.chunk(&source);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = gateway.encode(&texts).await?;

        let entries = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry::new(chunk.id, vector))
            .collect();
        let index = VectorIndex::build(gateway.dimensions(), entries)?;

        tracing::info!(
            "Built snapshot v{}: {} chunks from {} bytes in {:.2}s",
            version,
            chunks.len(),
            source.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(Self {
            version,
            source_sha256: sha256_hex(&source),
            source,
            chunks,
            index,
            built_at: Utc::now(),
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The full knowledge text this snapshot was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Hex SHA-256 of the source text.
    pub fn source_sha256(&self) -> &str {
        &self.source_sha256
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

pub(crate) fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
