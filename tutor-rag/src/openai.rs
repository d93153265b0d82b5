//! Remote embedding backend using an OpenAI-compatible embeddings API.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI embeddings API endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Fixed timeout applied to every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`EmbeddingProvider`] backed by a remote embeddings API.
///
/// The dimensionality is taken from configuration and every response
/// vector is checked against it; a disagreement is a
/// [`RagError::DimensionMismatch`] rather than silently adopted.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_rag::openai::OpenAiEmbedder;
///
/// let embedder = OpenAiEmbedder::new("sk-...", "text-embedding-3-small", 1536)?;
/// let vector = embedder.embed("hello world").await?;
/// assert_eq!(vector.len(), 1536);
/// ```
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedder with the given API key, model, and
    /// configured dimensionality.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Config("API key must not be empty".into()));
        }
        if dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be greater than zero".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: OPENAI_EMBEDDINGS_URL.to_string(),
            api_key,
            model: model.into(),
            dimensions,
        })
    }

    /// Create a new embedder using the `OPENAI_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>, dimensions: usize) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::Config("OPENAI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key, model, dimensions)
    }

    /// Point the embedder at a compatible server's embeddings endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn transient(&self, message: String) -> RagError {
        RagError::Embedding { provider: self.model.clone(), message, transient: true }
    }

    fn malformed(&self, message: String) -> RagError {
        RagError::Embedding { provider: self.model.clone(), message, transient: false }
    }
}

// ── Embeddings API request/response types ──────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| self.malformed("API returned an empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, batch_size = texts.len(), "embedding batch");

        let request_body =
            EmbeddingRequest { model: &self.model, input: texts.to_vec(), dimensions: self.dimensions };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "embedding request failed");
                self.transient(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(model = %self.model, %status, "embedding API error");
            return Err(self.transient(format!("API returned {status}: {detail}")));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse embedding response");
            self.malformed(format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(self.malformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        for vector in &vectors {
            if vector.len() != self.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                });
            }
        }

        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
