//! Error types for the `tutor-model` crate.

use thiserror::Error;

/// Errors produced by language model backends.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid client configuration (bad URL, missing credentials).
    #[error("Model configuration error: {0}")]
    Config(String),

    /// The backend could not be reached or returned an error payload.
    ///
    /// Transient: callers may retry with backoff.
    #[error("Model backend error ({provider}): {message}")]
    Backend {
        /// The backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The backend replied with output the client could not interpret.
    ///
    /// Non-transient: retrying yields the same malformed payload.
    #[error("Malformed model response ({provider}): {message}")]
    MalformedResponse {
        /// The backend that produced the response.
        provider: String,
        /// A description of what failed to parse.
        message: String,
    },

    /// A streaming generation failed after it had started.
    #[error("Stream error: {0}")]
    Stream(String),
}

impl ModelError {
    /// Whether retrying the same request can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Backend { .. } | ModelError::Stream(_))
    }
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
