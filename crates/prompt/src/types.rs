//! Prompt types.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in grounding prompt.
pub const DEFAULT_PROMPT_ID: &str = "grounded.answer.default";

/// A prompt definition, either built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Instruction telling the generator to stay within the context.
    /// Falls back to the built-in instruction when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,

    /// Handlebars template; variables: `context`, `instruction`, `query`
    pub template: String,
}

/// A rendered grounding prompt ready for the generator.
///
/// Keeps the context and question next to the rendered text so that the
/// heuristic fallback never has to parse them back out of the prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundingPrompt {
    /// Full prompt text sent to the generator
    pub text: String,

    /// Retrieved passages joined by blank lines
    pub context: String,

    /// The user's question
    pub question: String,

    /// Number of passages in the context
    pub passage_count: usize,

    /// Source prompt definition ID
    pub source_prompt_id: String,
}

impl GroundingPrompt {
    /// Whether any retrieved passage made it into the prompt.
    pub fn has_context(&self) -> bool {
        self.passage_count > 0
    }
}
