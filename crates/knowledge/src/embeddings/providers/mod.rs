//! Embedding provider implementations.

#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod ollama;
pub mod trigram;

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use trigram::TrigramProvider;
