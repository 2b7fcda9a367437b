//! Provider identification.

/// Generation provider kinds known to the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Ollama,
    OpenAI,
    HuggingFace,
    /// No remote generator; answers come from the local heuristic only
    None,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAI),
            "huggingface" | "hf" => Some(Self::HuggingFace),
            "none" | "offline" => Some(Self::None),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::HuggingFace => "huggingface",
            Self::None => "none",
        }
    }

    /// Default base URL for the provider's API.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => Some("http://localhost:11434"),
            Self::OpenAI => Some("https://api.openai.com/v1"),
            Self::HuggingFace => Some("https://router.huggingface.co/v1"),
            Self::None => None,
        }
    }

    /// Whether the provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::HuggingFace)
    }
}
