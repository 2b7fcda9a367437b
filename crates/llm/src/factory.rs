//! LLM provider factory.
//!
//! Resolves a provider name into a concrete client, applying the endpoint,
//! API key and request deadline.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatibleClient};
use crate::types::ProviderType;
use grounded_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// Returns `Ok(None)` for the `none` provider, which means "answer with the
/// local heuristic only".
///
/// # Errors
/// - `AppError::Config` if the provider is unknown
/// - `AppError::GeneratorUnavailable` if a required API key is missing
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Option<Arc<dyn LlmClient>>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    if provider_type.requires_api_key() && api_key.map_or(true, |k| k.trim().is_empty()) {
        return Err(AppError::GeneratorUnavailable(format!(
            "{} provider requires an API key",
            provider_type.as_str()
        )));
    }

    let base_url = endpoint
        .or(provider_type.default_endpoint())
        .unwrap_or_default();

    let client: Arc<dyn LlmClient> = match provider_type {
        ProviderType::None => return Ok(None),
        ProviderType::Ollama => Arc::new(OllamaClient::with_base_url(base_url).with_timeout(timeout)),
        ProviderType::OpenAI | ProviderType::HuggingFace => Arc::new(
            OpenAiCompatibleClient::new(provider_type.as_str(), base_url, api_key.unwrap_or_default())
                .with_timeout(timeout),
        ),
    };

    tracing::debug!("Created {} client for {}", client.provider_name(), base_url);

    Ok(Some(client))
}
