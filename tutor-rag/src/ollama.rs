//! Local embedding backend using an Ollama model server.
//!
//! This module is only available when the `ollama` feature is enabled.
//!
//! Ollama runs the embedding model locally and exposes it over HTTP, so
//! this is the "local inference" variant of the embedding capability; it
//! is interchangeable with the remote
//! [`OpenAiEmbedder`](crate::openai::OpenAiEmbedder) by configuration.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default Ollama server address.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Fixed timeout applied to every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`EmbeddingProvider`] backed by a local Ollama server.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_rag::ollama::OllamaEmbedder;
///
/// let embedder = OllamaEmbedder::new("nomic-embed-text", 768)?;
/// let vector = embedder.embed("hello world").await?;
/// ```
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a new embedder for the given model and configured
    /// dimensionality, talking to `http://localhost:11434`.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, model, dimensions)
    }

    /// Create a new embedder talking to a custom server address.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be greater than zero".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }

    /// Check whether the server is reachable.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn transient(&self, message: String) -> RagError {
        RagError::Embedding { provider: self.model.clone(), message, transient: true }
    }

    fn malformed(&self, message: String) -> RagError {
        RagError::Embedding { provider: self.model.clone(), message, transient: false }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| self.malformed("server returned an empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, batch_size = texts.len(), "embedding batch via ollama");

        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest { model: &self.model, input: texts.to_vec() };

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!(model = %self.model, error = %e, "ollama embedding request failed");
            self.transient(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, %status, "ollama embedding error");
            return Err(self.transient(format!("server returned {status}: {body}")));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse ollama response");
            self.malformed(format!("failed to parse response: {e}"))
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(self.malformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        for vector in &parsed.embeddings {
            if vector.len() != self.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                });
            }
        }

        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
