//! RAG answering orchestration.
//!
//! Retrieves relevant chunks, assembles the grounding prompt and asks the
//! generator, falling back to the local heuristic whenever the generator
//! cannot answer.

use crate::rag::generator::{create_generator, HeuristicFallbackGenerator, TextGenerator};
use crate::rag::types::{RagResponse, RagSourceRef};
use crate::retriever::RetrievalResult;
use crate::store::{KnowledgeStats, KnowledgeStore};
use grounded_core::{AppConfig, AppError, AppResult};
use grounded_prompt::types::DEFAULT_PROMPT_ID;
use grounded_prompt::{
    build_prompt, fallback_answer, load_prompt_or_default, GroundingPrompt, PromptDefinition,
};
use std::sync::Arc;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;

/// Build the grounding prompt for `query` from retrieved chunks, in result
/// order.
pub fn assemble_prompt(
    definition: &PromptDefinition,
    query: &str,
    retrieved: &RetrievalResult,
) -> AppResult<GroundingPrompt> {
    build_prompt(definition, query, &retrieved.texts())
}

/// Question answering over a knowledge store.
#[derive(Debug, Clone)]
pub struct RagEngine {
    store: Arc<KnowledgeStore>,
    generator: Arc<dyn TextGenerator>,
    prompt: PromptDefinition,
    top_k: usize,
}

impl RagEngine {
    pub fn new(store: Arc<KnowledgeStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store,
            generator,
            prompt: PromptDefinition::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Open the configured knowledge file, generator and prompt.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let store = Arc::new(KnowledgeStore::from_config(config).await?);
        let generator = create_generator(config)?;
        let prompt = load_prompt_or_default(&config.workspace, DEFAULT_PROMPT_ID)?;

        tracing::info!(
            "RAG engine ready: generator={}, top_k={}, snapshot v{}",
            generator.name(),
            config.knowledge.top_k,
            store.snapshot().version()
        );

        Ok(Self::new(store, generator)
            .with_prompt(prompt)
            .with_top_k(config.knowledge.top_k))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `query` from the knowledge base.
    ///
    /// Generator failures never reach the caller: the heuristic answer is
    /// returned instead. A blank query, retrieval errors and embedding errors
    /// are returned as errors.
    pub async fn ask(&self, query: &str) -> AppResult<RagResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidArgument(
                "Question must not be empty".to_string(),
            ));
        }

        let retrieved = self.store.retrieve(query, self.top_k).await?;
        let prompt = assemble_prompt(&self.prompt, query, &retrieved)?;

        let (answer, used_fallback, generator) = if !prompt.has_context() {
            tracing::info!("No context retrieved, answering without the generator");
            (
                fallback_answer(query, ""),
                true,
                HeuristicFallbackGenerator.name().to_string(),
            )
        } else {
            match self.generator.generate(&prompt).await {
                Ok(answer) => (
                    answer,
                    self.generator.is_local(),
                    self.generator.name().to_string(),
                ),
                Err(e) => {
                    tracing::warn!(
                        "Generator '{}' unavailable, using heuristic fallback: {}",
                        self.generator.name(),
                        e
                    );
                    (
                        fallback_answer(&prompt.question, &prompt.context),
                        true,
                        HeuristicFallbackGenerator.name().to_string(),
                    )
                }
            }
        };

        tracing::debug!(
            "Answered from snapshot v{} with {} sources (fallback: {})",
            retrieved.snapshot_version,
            retrieved.len(),
            used_fallback
        );

        Ok(RagResponse {
            answer,
            sources: retrieved.chunks.iter().map(RagSourceRef::from).collect(),
            top_score: retrieved.top_score(),
            snapshot_version: retrieved.snapshot_version,
            used_fallback,
            generator,
        })
    }

    /// Append `new_text` to the knowledge base and rebuild.
    pub async fn update_knowledge(&self, new_text: &str) -> AppResult<KnowledgeStats> {
        self.store.append(new_text).await?;
        Ok(self.store.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::{ChunkConfig, Chunker};
    use crate::embeddings::providers::TrigramProvider;
    use crate::embeddings::{EmbeddingConfig, EmbeddingGateway};
    use crate::rag::generator::testing::ScriptedClient;
    use crate::rag::generator::{GenerationParams, RemoteGenerator};
    use grounded_prompt::{NO_CONTEXT_ANSWER, NO_MATCH_ANSWER};
    use std::time::Duration;

    const CORPUS: &str = "Cats are mammals.\n\nDogs are mammals too.";

    async fn store(source: &str) -> Arc<KnowledgeStore> {
        let gateway = EmbeddingGateway::new(
            Arc::new(TrigramProvider::new(384)),
            &EmbeddingConfig::default(),
        );
        let store = KnowledgeStore::in_memory(Chunker::new(ChunkConfig::default()).unwrap(), gateway);
        if !source.is_empty() {
            store.load(source).await.unwrap();
        }
        Arc::new(store)
    }

    fn remote(client: Arc<ScriptedClient>) -> Arc<dyn TextGenerator> {
        let params = GenerationParams {
            timeout: Duration::from_millis(100),
            ..Default::default()
        };
        Arc::new(RemoteGenerator::new(client, params))
    }

    #[tokio::test]
    async fn test_assemble_prompt_keeps_result_order() {
        let store = store(CORPUS).await;
        let retrieved = store.retrieve("Are dogs mammals?", 2).await.unwrap();

        let prompt =
            assemble_prompt(&PromptDefinition::default(), "Are dogs mammals?", &retrieved).unwrap();

        assert!(prompt.text.starts_with("Context:\nDogs are mammals too.\n\nCats are mammals."));
        assert!(prompt.text.contains("Question: Are dogs mammals?"));
    }

    #[tokio::test]
    async fn test_ask_uses_remote_generator() {
        let client = Arc::new(ScriptedClient::replying("Yes, dogs are mammals."));
        let engine = RagEngine::new(store(CORPUS).await, remote(client.clone()));

        let response = engine.ask("Are dogs mammals?").await.unwrap();

        assert_eq!(response.answer, "Yes, dogs are mammals.");
        assert!(!response.used_fallback);
        assert_eq!(response.generator, "scripted");
        assert_eq!(response.snapshot_version, 1);
        assert_eq!(response.sources[0].snippet, "Dogs are mammals too.");
        assert!(response.top_score.is_some());
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back() {
        let client = Arc::new(ScriptedClient::failing("503 service unavailable"));
        let engine = RagEngine::new(store(CORPUS).await, remote(client)).with_top_k(1);

        let response = engine.ask("Are dogs mammals?").await.unwrap();

        assert!(response.used_fallback);
        assert_eq!(response.generator, "heuristic");
        assert_eq!(
            response.answer,
            "Based on the information available: Dogs are mammals too."
        );
    }

    #[tokio::test]
    async fn test_generator_timeout_falls_back() {
        let client = Arc::new(ScriptedClient::slow(Duration::from_secs(5)));
        let engine = RagEngine::new(store(CORPUS).await, remote(client));

        let response = engine.ask("Are dogs mammals?").await.unwrap();
        assert!(response.used_fallback);
        assert!(!response.answer.is_empty());
    }

    #[tokio::test]
    async fn test_no_match_message_when_context_is_unrelated() {
        let engine = RagEngine::new(
            store(CORPUS).await,
            Arc::new(HeuristicFallbackGenerator),
        );

        let response = engine.ask("what about rust?").await.unwrap();
        assert_eq!(response.answer, NO_MATCH_ANSWER);
        assert!(response.used_fallback);
    }

    #[tokio::test]
    async fn test_empty_store_skips_generator() {
        let client = Arc::new(ScriptedClient::replying("should not be called"));
        let engine = RagEngine::new(store("").await, remote(client.clone()));

        let response = engine.ask("Are dogs mammals?").await.unwrap();

        assert_eq!(response.answer, NO_CONTEXT_ANSWER);
        assert!(response.used_fallback);
        assert!(response.sources.is_empty());
        assert_eq!(response.snapshot_version, 0);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let engine = RagEngine::new(store(CORPUS).await, Arc::new(HeuristicFallbackGenerator));
        assert!(matches!(
            engine.ask("  ").await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_update_knowledge_then_ask() {
        let engine = RagEngine::new(store(CORPUS).await, Arc::new(HeuristicFallbackGenerator));

        let stats = engine
            .update_knowledge("Octopuses have three hearts.")
            .await
            .unwrap();
        assert_eq!(stats.version, 2);
        assert_eq!(stats.chunk_count, 3);

        let response = engine.ask("How many hearts do octopuses have?").await.unwrap();
        assert_eq!(response.snapshot_version, 2);
        assert_eq!(
            response.answer,
            "Based on the information available: Octopuses have three hearts."
        );
    }

    #[tokio::test]
    async fn test_custom_prompt_definition_is_used() {
        let client = Arc::new(ScriptedClient::replying("ok"));
        let prompt = PromptDefinition {
            id: "terse".to_string(),
            title: "Terse".to_string(),
            api_version: "1.0".to_string(),
            instruction: Some("One word only.".to_string()),
            template: "{{instruction}}\n{{context}}\nQ: {{query}}".to_string(),
        };
        let engine = RagEngine::new(store(CORPUS).await, remote(client.clone())).with_prompt(prompt);

        engine.ask("Are dogs mammals?").await.unwrap();

        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert!(request.prompt.starts_with("One word only.\n"));
        assert!(request.prompt.ends_with("Q: Are dogs mammals?"));
    }
}
