//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Composes retrieval, prompt assembly and generation with a local fallback.

pub mod ask;
pub mod generator;
pub mod types;

pub use ask::{assemble_prompt, RagEngine, DEFAULT_TOP_K};
pub use generator::{
    create_generator, GenerationParams, HeuristicFallbackGenerator, RemoteGenerator,
    TextGenerator,
};
pub use types::{RagResponse, RagSourceRef};
