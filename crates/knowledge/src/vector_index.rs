//! Exact nearest-neighbor index over unit vectors.
//!
//! Cosine similarity is computed as the inner product of L2-normalized
//! vectors. Every search scores all entries and partially sorts them, which
//! is fast enough for a single-file knowledge base of a few thousand chunks.
//! The index is immutable; every knowledge update builds a fresh one.

use crate::embeddings::l2_normalize;
use grounded_core::{AppError, AppResult};
use std::cmp::Ordering;

/// A chunk id paired with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk_id: usize,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(chunk_id: usize, vector: Vec<f32>) -> Self {
        Self { chunk_id, vector }
    }
}

/// One search result: the stored position of an entry and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Position of the entry in build order
    pub position: usize,

    /// Cosine similarity in `[-1, 1]`
    pub score: f32,
}

/// Immutable index of normalized vectors.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimensions: usize,
    chunk_ids: Vec<usize>,
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// Build an index from exactly the given entries.
    ///
    /// Vectors are normalized on the way in. All vectors must share one
    /// dimensionality; `dimensions` pins it even when `entries` is empty.
    pub fn build(dimensions: usize, entries: Vec<IndexEntry>) -> AppResult<Self> {
        let mut chunk_ids = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len() * dimensions);

        for entry in entries {
            if entry.vector.len() != dimensions {
                return Err(AppError::InvalidArgument(format!(
                    "Entry for chunk {} has {} dimensions, index expects {}",
                    entry.chunk_id,
                    entry.vector.len(),
                    dimensions
                )));
            }

            let mut vector = entry.vector;
            l2_normalize(&mut vector);
            chunk_ids.push(entry.chunk_id);
            vectors.extend_from_slice(&vector);
        }

        tracing::debug!(
            "Built vector index: {} entries, {} dimensions",
            chunk_ids.len(),
            dimensions
        );

        Ok(Self {
            dimensions,
            chunk_ids,
            vectors,
        })
    }

    /// An index with no entries.
    pub fn empty(dimensions: usize) -> Self {
        Self {
            dimensions,
            chunk_ids: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chunk_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_ids.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Chunk id stored at `position`.
    pub fn chunk_id(&self, position: usize) -> Option<usize> {
        self.chunk_ids.get(position).copied()
    }

    /// Normalized vector stored at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimensions;
        self.vectors.get(start..start + self.dimensions)
    }

    /// Return the `k` entries most similar to `query`, best first.
    ///
    /// Returns `min(k, len)` hits with non-increasing scores; equal scores
    /// keep the lower position first. The query is normalized here, so
    /// callers may pass raw vectors.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if k == 0 {
            return Err(AppError::InvalidArgument(
                "k must be greater than 0".to_string(),
            ));
        }

        if query.len() != self.dimensions {
            return Err(AppError::InvalidArgument(format!(
                "Query has {} dimensions, index expects {}",
                query.len(),
                self.dimensions
            )));
        }

        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut hits: Vec<SearchHit> = self
            .vectors
            .chunks_exact(self.dimensions.max(1))
            .enumerate()
            .map(|(position, vector)| SearchHit {
                position,
                score: dot(&query, vector).clamp(-1.0, 1.0),
            })
            .collect();

        let k = k.min(hits.len());
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, rank);
            hits.truncate(k);
        }
        hits.sort_by(rank);

        Ok(hits)
    }
}

/// Descending score, then ascending position.
fn rank(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.position.cmp(&b.position))
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
