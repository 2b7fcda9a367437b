//! Retrieval core for Grounded.
//!
//! Splits a knowledge file into chunks, embeds them, and answers questions
//! from the most similar chunks:
//! - [`chunker`]: paragraph chunking with word windows for long paragraphs
//! - [`embeddings`]: provider-agnostic embedding gateway
//! - [`vector_index`]: exact cosine-similarity search
//! - [`snapshot`] / [`store`]: versioned, atomically swapped knowledge state
//! - [`retriever`]: query → top-k chunks
//! - [`rag`]: prompt assembly, generation and heuristic fallback
//!
//! # Example
//! ```no_run
//! use grounded_core::AppConfig;
//! use grounded_knowledge::RagEngine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let engine = RagEngine::from_config(&config).await?;
//! let response = engine.ask("Are dogs mammals?").await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod embeddings;
pub mod rag;
pub mod retriever;
pub mod snapshot;
pub mod store;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::{Chunk, ChunkConfig, Chunker};
pub use embeddings::{EmbeddingConfig, EmbeddingGateway, EmbeddingProvider};
pub use rag::{RagEngine, RagResponse, RagSourceRef, TextGenerator};
pub use retriever::{RetrievalResult, RetrievedChunk, Retriever};
pub use snapshot::KnowledgeSnapshot;
pub use store::{KnowledgeStats, KnowledgeStore, StoreState};
pub use vector_index::{IndexEntry, SearchHit, VectorIndex};
