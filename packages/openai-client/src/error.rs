//! Error types for OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// OpenAI client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Missing API key or an HTTP client that could not be built
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failed or timed out before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body was not the shape we expected
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OpenAIError {
    /// True when the request never produced an HTTP response.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
