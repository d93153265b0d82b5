//! Error types for the `tutor-rag` crate.
//!
//! Component-internal errors are never shown raw to an end user: each
//! boundary translates them via [`RagError::user_message`]. The "no
//! relevant context" case is not an error but an explicit retrieval
//! outcome, so users can always tell "I have no answer" apart from
//! "something broke".

use thiserror::Error;

/// Errors that can occur in the retrieval-augmented pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid parameter combination. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document failed validation (e.g. empty content). Recovered
    /// per-document during batch ingestion.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A document could not be read or is unsupported. Recovered
    /// per-document during batch ingestion.
    #[error("Load error ({path}): {message}")]
    Load {
        /// The path that failed to load.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding backend failure.
    #[error("Embedding backend error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
        /// Whether a retry with backoff may succeed. Malformed-output
        /// errors are non-transient and must not be retried.
        transient: bool,
    },

    /// The vector index backend cannot be reached. Fatal for the current
    /// request; not retried automatically.
    #[error("Vector index unavailable ({backend}): {message}")]
    IndexUnavailable {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector's length disagrees with the collection's established
    /// dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The collection's configured dimensionality.
        expected: usize,
        /// The offending vector's length.
        actual: usize,
    },

    /// A language model backend failure.
    #[error(transparent)]
    Llm(#[from] tutor_model::ModelError),
}

impl RagError {
    /// Whether a retry with backoff may reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RagError::Embedding { transient, .. } => *transient,
            RagError::Llm(e) => e.is_transient(),
            _ => false,
        }
    }

    /// A stable, user-safe message for this error.
    ///
    /// Full detail stays in the logs; this string is what a boundary may
    /// show to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            RagError::Validation(_) | RagError::Load { .. } => {
                "The document could not be processed. Check that it is readable and not empty."
            }
            _ => "Something went wrong while processing your request. Please try again.",
        }
    }
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
