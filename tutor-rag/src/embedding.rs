//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific backends, a remote API
/// ([`OpenAiEmbedder`](crate::openai::OpenAiEmbedder)) or a local model
/// server ([`OllamaEmbedder`](crate::ollama::OllamaEmbedder)), behind a
/// unified async interface. The backend is selected by configuration,
/// never by branching at call sites.
///
/// Providers must be deterministic for a fixed backend and model version:
/// embedding the same text twice yields the same vector, up to documented
/// backend-level floating point noise. Batch order never affects
/// per-item results.
///
/// The dimensionality is fixed by configuration for the lifetime of an
/// index and is never re-derived from the backend mid-session; a vector
/// store must never mix dimensionalities within one collection.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, one per
    /// input, in input order.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially. Override this method if the backend supports native
    /// batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
