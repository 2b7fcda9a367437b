//! Prompt assembly for Grounded.
//!
//! This crate turns retrieved passages and a question into a grounding
//! prompt, and supplies the local fallback answer used when no remote
//! generator is available:
//! - YAML-overridable prompt definitions
//! - Handlebars template rendering
//! - Sentence-matching fallback answers

pub mod builder;
pub mod fallback;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, DEFAULT_INSTRUCTION, DEFAULT_TEMPLATE};
pub use fallback::{fallback_answer, NO_CONTEXT_ANSWER, NO_MATCH_ANSWER};
pub use loader::{list_prompts, load_prompt, load_prompt_or_default, validate_prompt};
pub use types::{GroundingPrompt, PromptDefinition};
