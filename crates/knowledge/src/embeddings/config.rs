//! Embedding configuration.

use grounded_core::config::EmbeddingSettings;
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Providers `create_provider` can build.
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Resolved embedding configuration for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions, fixed for the session
    pub dimensions: usize,

    /// Maximum texts per provider call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Deadline for one provider call
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Provider endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_batch_size() -> usize {
    100
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
            timeout: default_timeout(),
            endpoint: None,
        }
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.to_lowercase(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size,
            timeout: Duration::from_secs(settings.timeout_secs),
            endpoint: settings.endpoint.clone(),
        }
    }
}

impl EmbeddingConfig {
    /// Reject configurations no provider can honor.
    pub fn validate(&self) -> AppResult<()> {
        if !SUPPORTED_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: '{}'. Supported providers: {}",
                self.provider,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }

        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batchSize must be greater than 0".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(AppError::Config(
                "Embedding timeoutSecs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
