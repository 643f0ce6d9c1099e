//! Typed errors for each capability seam.
//!
//! Library code returns these; only the binary and config loading use
//! `anyhow`.

use thiserror::Error;

/// Listing fetch failures, classified the way the add-job flow reports them.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request was sent but no response came back (refused, DNS, timeout)
    #[error("no response received from {url}: {message}")]
    Network { url: String, message: String },

    /// Server answered with a status outside 2xx
    #[error("HTTP error status {status} from {url}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// URL or request could not be built
    #[error("request setup error for {url:?}: {message}")]
    Setup { url: String, message: String },
}

/// Extraction service failures. Never fatal: the workflow falls back to
/// empty fields.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No credential was configured for the extraction service
    #[error("extraction service credential missing: {0} is not set")]
    MissingCredential(&'static str),

    /// The service call itself failed
    #[error("extraction service error: {0}")]
    Service(#[from] openai_client::OpenAIError),
}

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation attempted after `close()`
    #[error("store closed")]
    Closed,

    /// Statement or connection failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row held a value outside the model's domain
    #[error("corrupt row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },
}

/// Interaction failures.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Terminal I/O failed (closed stdin, not a tty)
    #[error("prompt failed: {0}")]
    Io(#[from] dialoguer::Error),

    /// A selection outside the offered choices
    #[error("invalid choice {index} for {label:?} ({len} options)")]
    InvalidChoice {
        label: String,
        index: usize,
        len: usize,
    },

    /// Free text that does not parse as the requested value
    #[error("invalid input for {label:?}: {value:?}")]
    InvalidInput { label: String, value: String },

    /// A scripted prompter ran out of answers
    #[error("no answer available for {0:?}")]
    Exhausted(String),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type PromptResult<T> = std::result::Result<T, PromptError>;
