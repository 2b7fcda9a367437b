//! Text-generation boundary for Grounded.
//!
//! This crate provides a provider-agnostic abstraction over the external
//! text generator that turns a grounding prompt into an answer. Every call
//! runs under a deadline; expiry surfaces as `AppError::Timeout`.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (`/api/generate`)
//! - **OpenAI-compatible**: OpenAI, the Hugging Face router, or any
//!   `/chat/completions` endpoint
//!
//! # Example
//! ```no_run
//! use grounded_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatibleClient};
pub use types::ProviderType;
