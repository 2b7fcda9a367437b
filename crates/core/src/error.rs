//! Error types for Grounded.
//!
//! This module defines a unified error enum covering the retrieval core's
//! error taxonomy (configuration, embedding, invalid arguments, rebuild
//! conflicts, generator failures, timeouts) plus I/O and serialization.

use thiserror::Error;

/// Unified error type for Grounded.
///
/// All fallible functions return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid configuration (e.g. chunk window overlap >= window size)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider failures (service error, malformed output)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Rejected input: bad `k`, empty query, blank update text
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A knowledge rebuild is already running
    #[error("Knowledge rebuild already in progress")]
    RebuildInProgress,

    /// The external text generator could not produce an answer
    #[error("Generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// A call exceeded its deadline
    #[error("Timed out after {0:.1}s: {1}")]
    Timeout(f64, String),

    /// LLM transport/protocol errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge store errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the caller may reasonably retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::RebuildInProgress | AppError::Timeout(..) | AppError::GeneratorUnavailable(_)
        )
    }

    /// Build a timeout error from a duration and the operation that expired.
    pub fn timeout(after: std::time::Duration, operation: impl Into<String>) -> Self {
        AppError::Timeout(after.as_secs_f64(), operation.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
