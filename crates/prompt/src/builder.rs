//! Prompt builder for rendering grounding templates.

use crate::types::{GroundingPrompt, PromptDefinition, DEFAULT_PROMPT_ID};
use grounded_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Instruction keeping the generator inside the retrieved context.
pub const DEFAULT_INSTRUCTION: &str = "Answer the question using ONLY the provided context. \
If the answer is not in the context, say \"I don't have information about that in my knowledge base.\"";

/// Built-in grounding template.
pub const DEFAULT_TEMPLATE: &str =
    "Context:\n{{context}}\n\n{{instruction}}\n\nQuestion: {{query}}\nAnswer:";

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Grounded answer".to_string(),
            api_version: "1.0".to_string(),
            instruction: None,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// Build a grounding prompt from retrieved passages and a question.
///
/// Passages are joined in the given order, separated by a blank line, and
/// rendered into the `Context` section of the template.
///
/// # Example
/// ```
/// use grounded_prompt::{build_prompt, PromptDefinition};
///
/// let prompt = build_prompt(
///     &PromptDefinition::default(),
///     "Are dogs mammals?",
///     &["Dogs are mammals too."],
/// )
/// .unwrap();
/// assert!(prompt.text.contains("Question: Are dogs mammals?"));
/// ```
pub fn build_prompt<S: AsRef<str>>(
    definition: &PromptDefinition,
    query: &str,
    passages: &[S],
) -> AppResult<GroundingPrompt> {
    tracing::debug!(
        "Building prompt '{}' with {} passages",
        definition.id,
        passages.len()
    );

    let context = passages
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    let passage_count = passages
        .iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .count();

    let instruction = definition
        .instruction
        .as_deref()
        .unwrap_or(DEFAULT_INSTRUCTION);

    let mut variables = HashMap::new();
    variables.insert("context", context.as_str());
    variables.insert("instruction", instruction);
    variables.insert("query", query);

    let text = render_template(&definition.template, &variables)?;

    Ok(GroundingPrompt {
        text,
        context,
        question: query.to_string(),
        passage_count,
        source_prompt_id: definition.id.clone(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<&str, &str>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
