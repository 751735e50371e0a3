//! Error types for the LLM subsystem.

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Unknown model preset
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// No API key was configured
    #[error("missing API key for {provider}")]
    MissingApiKey {
        /// Provider name
        provider: String,
    },

    /// API error with status code
    #[error("API error ({provider}): status {status}, {message}")]
    ApiError {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Response parsing error
    #[error("failed to parse response from {provider}: {message}")]
    ParseError {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;
