//! OpenAI-compatible chat completions client.
//!
//! Works against any `/chat/completions` endpoint: OpenAI itself, the
//! Hugging Face inference router, or a self-hosted server. Providers differ
//! only by base URL and API key.

use super::{error_from_response, map_transport_error, DEFAULT_TIMEOUT};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use grounded_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Client for OpenAI-compatible APIs.
pub struct OpenAiCompatibleClient {
    /// Provider name used in logs and errors (e.g., "openai", "huggingface")
    name: String,
    /// Base URL without the trailing path (e.g., "https://api.openai.com/v1")
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    /// Create a client for the given provider name, base URL and key.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Set the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the chat completions request body.
    fn request_body(&self, request: &LlmRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }

    fn convert_response(&self, completion: ChatCompletion, requested_model: &str) -> AppResult<LlmResponse> {
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::GeneratorUnavailable(format!("{} returned no completion choices", self.name))
            })?;

        let usage = completion
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let model = if completion.model.is_empty() {
            requested_model.to_string()
        } else {
            completion.model
        };

        Ok(LlmResponse { content, model, usage })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, request), fields(provider = %self.name, model = %request.model))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!("Sending chat completion to {}", url);

        let mut builder = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&self.request_body(request));

        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_transport_error(&self.name, self.timeout, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(&self.name, response).await);
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AppError::timeout(self.timeout, format!("reading {} response", self.name))
            } else {
                AppError::GeneratorUnavailable(format!("Failed to parse {} response: {}", self.name, e))
            }
        })?;

        self.convert_response(completion, &request.model)
    }
}
