//! The language model capability trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;

/// A lazy, finite, non-restartable sequence of generated text increments.
///
/// Tokens arrive in generation order. Dropping the stream cancels the
/// generation and releases the underlying connection.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A single generation request: an optional system instruction, the user
/// prompt, and sampling parameters.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Optional system instruction prepended to the conversation.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Sampling temperature. Backend default when `None`.
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate. Backend default when `None`.
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Create a request for the given user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), ..Default::default() }
    }

    /// Set the system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A language model capable of text generation.
///
/// Implementations wrap a specific inference backend (remote API or local
/// server) behind a unified async interface. Both completion styles submit
/// the same prompt; [`generate_stream`](Llm::generate_stream) delivers the
/// answer incrementally instead of buffering it.
#[async_trait]
pub trait Llm: Send + Sync {
    /// The model identifier, used for logging.
    fn name(&self) -> &str;

    /// Generate a complete answer for the request.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Generate an answer as a stream of text increments.
    ///
    /// The returned stream yields tokens in generation order with no
    /// reordering or buffering. A failure mid-stream is reported as an
    /// `Err` item and terminates the stream.
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<TokenStream>;
}
