//! Concrete LLM provider clients.

pub mod ollama;
pub mod openai_compatible;

pub use ollama::OllamaClient;
pub use openai_compatible::OpenAiCompatibleClient;

use grounded_core::AppError;
use std::time::Duration;

/// Default deadline for a single completion request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Map a transport error to the error taxonomy.
///
/// Deadline expiry becomes `Timeout`; everything else means the generator
/// could not be reached.
pub(crate) fn map_transport_error(provider: &str, timeout: Duration, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::timeout(timeout, format!("{} completion request", provider))
    } else {
        AppError::GeneratorUnavailable(format!("Failed to reach {}: {}", provider, err))
    }
}

/// Turn a non-success HTTP response into a `GeneratorUnavailable` error.
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AppError::GeneratorUnavailable(format!("{} API error ({}): {}", provider, status, error_text))
}
