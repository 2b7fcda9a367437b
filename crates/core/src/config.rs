//! Configuration management for Grounded.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.grounded/config.yaml` in the workspace, or `GROUNDED_CONFIG`)
//! - Environment variables
//! - Command-line flags (`with_overrides`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generation providers understood by the LLM factory.
pub const KNOWN_GENERATION_PROVIDERS: [&str; 4] = ["ollama", "openai", "huggingface", "none"];

/// Embedding providers understood by the embedding factory.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .grounded/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit JSON log lines
    pub json_logs: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Knowledge source, chunking, and retrieval settings
    pub knowledge: KnowledgeSettings,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Text generator settings
    pub generation: GenerationSettings,
}

/// Knowledge source, chunking, and retrieval settings.
///
/// `max_chars_verbatim` is measured in characters while `window_words` and
/// `window_overlap_words` are measured in words: a paragraph at most
/// `max_chars_verbatim` characters long becomes one chunk, a longer one is
/// re-windowed by word count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSettings {
    /// Path of the UTF-8 knowledge file (relative paths resolve against the workspace)
    #[serde(default = "default_knowledge_file")]
    pub file: PathBuf,

    #[serde(default = "default_max_chars_verbatim")]
    pub max_chars_verbatim: usize,

    #[serde(default = "default_window_words")]
    pub window_words: usize,

    #[serde(default = "default_window_overlap_words")]
    pub window_overlap_words: usize,

    /// Number of chunks retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Optional relevance floor; hits scoring below it are dropped
    #[serde(default)]
    pub min_score: Option<f32>,
}

fn default_knowledge_file() -> PathBuf {
    PathBuf::from("knowledge.txt")
}

fn default_max_chars_verbatim() -> usize {
    512
}

fn default_window_words() -> usize {
    512
}

fn default_window_overlap_words() -> usize {
    50
}

fn default_top_k() -> usize {
    3
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            file: default_knowledge_file(),
            max_chars_verbatim: default_max_chars_verbatim(),
            window_words: default_window_words(),
            window_overlap_words: default_window_overlap_words(),
            top_k: default_top_k(),
            min_score: None,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" (offline) or "ollama"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_embedding_provider() -> String {
    "trigram".to_string()
}

fn default_embedding_model() -> String {
    "trigram-v1".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            endpoint: None,
        }
    }
}

/// Text generator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Provider name: "ollama", "openai", "huggingface", or "none" (heuristic only)
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Explicit API key (from `GROUNDED_API_KEY`), never written to disk
    #[serde(skip)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generation_provider() -> String {
    "ollama".to_string()
}

fn default_generation_model() -> String {
    "llama3.2".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            endpoint: None,
            api_key_env: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
    knowledge: Option<KnowledgeSettings>,
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub knowledge_file: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub top_k: Option<usize>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            json_logs: false,
            verbose: false,
            no_color: false,
            knowledge: KnowledgeSettings::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `GROUNDED_WORKSPACE`: Override workspace path
    /// - `GROUNDED_CONFIG`: Path to config file
    /// - `GROUNDED_KNOWLEDGE_FILE`: Knowledge file path
    /// - `GROUNDED_PROVIDER`: Generation provider
    /// - `GROUNDED_MODEL`: Generation model
    /// - `GROUNDED_ENDPOINT`: Generation endpoint
    /// - `GROUNDED_API_KEY`: Generation API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("GROUNDED_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("GROUNDED_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.grounded_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env(&mut self) {
        if let Ok(file) = std::env::var("GROUNDED_KNOWLEDGE_FILE") {
            self.knowledge.file = PathBuf::from(file);
        }

        if let Ok(provider) = std::env::var("GROUNDED_PROVIDER") {
            self.generation.provider = provider;
        }

        if let Ok(model) = std::env::var("GROUNDED_MODEL") {
            self.generation.model = model;
        }

        if let Ok(endpoint) = std::env::var("GROUNDED_ENDPOINT") {
            self.generation.endpoint = Some(endpoint);
        }

        if let Ok(key) = std::env::var("GROUNDED_API_KEY") {
            self.generation.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merged_with(file))
    }

    fn merged_with(&self, file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.json_logs = json;
            }
        }

        if let Some(knowledge) = file.knowledge {
            result.knowledge = knowledge;
        }

        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }

        if let Some(generation) = file.generation {
            result.generation = generation;
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over the config file and environment variables.
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(file) = overrides.knowledge_file {
            self.knowledge.file = file;
        }

        if let Some(provider) = overrides.provider {
            self.generation.provider = provider;
        }

        if let Some(model) = overrides.model {
            self.generation.model = model;
        }

        if let Some(top_k) = overrides.top_k {
            self.knowledge.top_k = top_k;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .grounded directory.
    pub fn grounded_dir(&self) -> PathBuf {
        self.workspace.join(".grounded")
    }

    /// Resolve the knowledge file path against the workspace.
    pub fn knowledge_path(&self) -> PathBuf {
        if self.knowledge.file.is_absolute() {
            self.knowledge.file.clone()
        } else {
            self.workspace.join(&self.knowledge.file)
        }
    }

    /// Resolve the generation API key.
    ///
    /// Order: `GROUNDED_API_KEY`, then the configured `apiKeyEnv`, then the
    /// provider's conventional variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.generation.api_key {
            return Some(key.clone());
        }

        let env_var = self.generation.api_key_env.clone().or_else(|| {
            match self.generation.provider.as_str() {
                "openai" => Some("OPENAI_API_KEY".to_string()),
                "huggingface" => Some("HF_TOKEN".to_string()),
                _ => None,
            }
        })?;

        std::env::var(env_var).ok().filter(|k| !k.trim().is_empty())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        let generation = self.generation.provider.as_str();
        if !KNOWN_GENERATION_PROVIDERS.contains(&generation) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                generation,
                KNOWN_GENERATION_PROVIDERS.join(", ")
            )));
        }

        let embedding = self.embedding.provider.as_str();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                embedding,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        let k = &self.knowledge;
        if k.top_k == 0 {
            return Err(AppError::Config("knowledge.topK must be at least 1".to_string()));
        }
        if k.max_chars_verbatim == 0 || k.window_words == 0 {
            return Err(AppError::Config(
                "knowledge.maxCharsVerbatim and knowledge.windowWords must be positive"
                    .to_string(),
            ));
        }
        if k.window_overlap_words >= k.window_words {
            return Err(AppError::Config(format!(
                "knowledge.windowOverlapWords ({}) must be smaller than knowledge.windowWords ({})",
                k.window_overlap_words, k.window_words
            )));
        }

        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.dimensions and embedding.batchSize must be positive".to_string(),
            ));
        }

        if self.embedding.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(AppError::Config("timeouts must be at least 1 second".to_string()));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AppError::Config(format!(
                "generation.temperature must be within 0.0-2.0, got {}",
                self.generation.temperature
            )));
        }

        Ok(())
    }
}
