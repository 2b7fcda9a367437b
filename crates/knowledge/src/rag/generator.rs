//! Text generators: a remote LLM or the local sentence heuristic.

use async_trait::async_trait;
use grounded_core::config::GenerationSettings;
use grounded_core::{AppConfig, AppError, AppResult};
use grounded_llm::{create_client, LlmClient, LlmRequest};
use grounded_prompt::{fallback_answer, GroundingPrompt};
use std::sync::Arc;
use std::time::Duration;

/// Turns a grounding prompt into answer text.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Short name for logs ("ollama", "heuristic", ...)
    fn name(&self) -> &str;

    /// Whether answers come from the local heuristic rather than a model.
    fn is_local(&self) -> bool {
        false
    }

    /// Produce an answer, or fail with `GeneratorUnavailable` / `Timeout`.
    async fn generate(&self, prompt: &GroundingPrompt) -> AppResult<String>;
}

/// Sampling parameters for remote generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl From<&GenerationSettings> for GenerationParams {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&GenerationSettings::default())
    }
}

/// Generator backed by an external LLM.
#[derive(Clone)]
pub struct RemoteGenerator {
    client: Arc<dyn LlmClient>,
    params: GenerationParams,
}

impl std::fmt::Debug for RemoteGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteGenerator")
            .field("provider", &self.client.provider_name())
            .field("params", &self.params)
            .finish()
    }
}

impl RemoteGenerator {
    pub fn new(client: Arc<dyn LlmClient>, params: GenerationParams) -> Self {
        Self { client, params }
    }
}

#[async_trait]
impl TextGenerator for RemoteGenerator {
    fn name(&self) -> &str {
        self.client.provider_name()
    }

    #[tracing::instrument(skip(self, prompt), fields(provider = %self.client.provider_name(), model = %self.params.model, prompt_len = prompt.text.len()))]
    async fn generate(&self, prompt: &GroundingPrompt) -> AppResult<String> {
        let request = LlmRequest::new(prompt.text.clone(), self.params.model.clone())
            .with_max_tokens(self.params.max_tokens)
            .with_temperature(self.params.temperature);

        let response = tokio::time::timeout(self.params.timeout, self.client.complete(&request))
            .await
            .map_err(|_| AppError::timeout(self.params.timeout, "text generation"))?
            .map_err(|e| match e {
                AppError::Timeout(..) | AppError::GeneratorUnavailable(_) => e,
                other => AppError::GeneratorUnavailable(other.to_string()),
            })?;

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(AppError::GeneratorUnavailable(
                "Generator returned an empty answer".to_string(),
            ));
        }

        Ok(answer.to_string())
    }
}

/// Local best-effort generator; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicFallbackGenerator;

#[async_trait]
impl TextGenerator for HeuristicFallbackGenerator {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &GroundingPrompt) -> AppResult<String> {
        Ok(fallback_answer(&prompt.question, &prompt.context))
    }
}

/// Build the configured generator.
///
/// The `none` provider, or a remote provider whose API key is missing,
/// yields the heuristic generator. Unknown providers are a config error.
pub fn create_generator(config: &AppConfig) -> AppResult<Arc<dyn TextGenerator>> {
    let settings = &config.generation;
    let api_key = config.resolve_api_key();

    let client = match create_client(
        &settings.provider,
        settings.endpoint.as_deref(),
        api_key.as_deref(),
        Duration::from_secs(settings.timeout_secs),
    ) {
        Ok(client) => client,
        Err(AppError::GeneratorUnavailable(reason)) => {
            tracing::warn!("Remote generator disabled: {}", reason);
            None
        }
        Err(e) => return Err(e),
    };

    Ok(match client {
        Some(client) => Arc::new(RemoteGenerator::new(client, GenerationParams::from(settings))),
        None => Arc::new(HeuristicFallbackGenerator),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use grounded_llm::{LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted LLM client for generator tests.
    #[derive(Debug)]
    pub struct ScriptedClient {
        pub reply: Result<String, String>,
        pub delay: Duration,
        pub calls: AtomicUsize,
        pub last_request: Mutex<Option<LlmRequest>>,
    }

    impl ScriptedClient {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub fn failing(reason: &str) -> Self {
            Self {
                reply: Err(reason.to_string()),
                ..Self::replying("")
            }
        }

        pub fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::replying("too late")
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_request.lock() {
                *last = Some(request.clone());
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(10, 5),
                }),
                Err(reason) => Err(AppError::Llm(reason.clone())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedClient;
    use super::*;
    use grounded_prompt::{build_prompt, PromptDefinition, NO_CONTEXT_ANSWER};

    fn prompt(passages: &[&str]) -> GroundingPrompt {
        build_prompt(&PromptDefinition::default(), "Are dogs mammals?", passages).unwrap()
    }

    #[tokio::test]
    async fn test_remote_generator_sends_parameters() {
        let client = Arc::new(ScriptedClient::replying("  Yes, dogs are mammals.  "));
        let generator = RemoteGenerator::new(client.clone(), GenerationParams::default());

        let answer = generator.generate(&prompt(&["Dogs are mammals too."])).await.unwrap();
        assert_eq!(answer, "Yes, dogs are mammals.");

        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.max_tokens, Some(200));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.model, "llama3.2");
        assert!(request.prompt.contains("Question: Are dogs mammals?"));
    }

    #[tokio::test]
    async fn test_remote_failure_is_generator_unavailable() {
        let client = Arc::new(ScriptedClient::failing("quota exceeded"));
        let generator = RemoteGenerator::new(client, GenerationParams::default());

        let result = generator.generate(&prompt(&["context"])).await;
        assert!(matches!(result, Err(AppError::GeneratorUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_remote_answer_is_generator_unavailable() {
        let client = Arc::new(ScriptedClient::replying("   "));
        let generator = RemoteGenerator::new(client, GenerationParams::default());

        let result = generator.generate(&prompt(&["context"])).await;
        assert!(matches!(result, Err(AppError::GeneratorUnavailable(_))));
    }

    #[tokio::test]
    async fn test_slow_remote_times_out() {
        let client = Arc::new(ScriptedClient::slow(Duration::from_millis(500)));
        let params = GenerationParams {
            timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let generator = RemoteGenerator::new(client, params);

        let result = generator.generate(&prompt(&["context"])).await;
        assert!(matches!(result, Err(AppError::Timeout(..))));
    }

    #[tokio::test]
    async fn test_heuristic_generator() {
        let generator = HeuristicFallbackGenerator;

        let answer = generator
            .generate(&prompt(&["Dogs are mammals too."]))
            .await
            .unwrap();
        assert_eq!(
            answer,
            "Based on the information available: Dogs are mammals too."
        );

        let answer = generator.generate(&prompt(&[])).await.unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
    }

    #[test]
    fn test_create_generator_none_is_heuristic() {
        let mut config = AppConfig::default();
        config.generation.provider = "none".to_string();

        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.name(), "heuristic");
        assert!(generator.is_local());
    }

    #[test]
    fn test_create_generator_ollama_is_remote() {
        let config = AppConfig::default();
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.name(), "ollama");
    }

    #[test]
    fn test_create_generator_unknown_provider() {
        let mut config = AppConfig::default();
        config.generation.provider = "carrier-pigeon".to_string();

        assert!(matches!(create_generator(&config), Err(AppError::Config(_))));
    }
}
