//! Configuration for the retrieval-augmented pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the pipeline.
///
/// Covers the full recognized surface: chunking, embedding, retrieval,
/// index identity, and generation. Construct via [`RagConfig::builder`],
/// which validates parameter combinations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum fragment size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive fragments in characters.
    pub chunk_overlap: usize,
    /// Embedding model identifier passed to the backend.
    pub embedding_model: String,
    /// Embedding dimensionality, fixed for the lifetime of a collection.
    pub embedding_dimensions: usize,
    /// Number of candidates to fetch from vector search.
    pub top_k: usize,
    /// Minimum similarity; results below it are discarded as irrelevant.
    pub similarity_threshold: f32,
    /// Name of the index collection.
    pub collection_name: String,
    /// Storage location of the index (path or URL, backend-dependent).
    pub storage_location: String,
    /// Sampling temperature for answer generation.
    pub llm_temperature: f32,
    /// Maximum number of generated tokens per answer.
    pub max_tokens: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            top_k: 5,
            similarity_threshold: 0.5,
            collection_name: "documents".to_string(),
            storage_location: "./vector_db".to_string(),
            llm_temperature: 0.5,
            max_tokens: 1000,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum fragment size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive fragments in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the embedding model identifier.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the embedding dimensionality.
    pub fn embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.config.embedding_dimensions = dimensions;
        self
    }

    /// Set the number of candidates fetched from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for retrieved fragments.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the index collection name.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the index storage location (path or URL).
    pub fn storage_location(mut self, location: impl Into<String>) -> Self {
        self.config.storage_location = location.into();
        self
    }

    /// Set the answer generation temperature.
    pub fn llm_temperature(mut self, temperature: f32) -> Self {
        self.config.llm_temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens per answer.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embedding_dimensions == 0`
    /// - `similarity_threshold` is outside `[0, 1]`
    /// - `max_tokens == 0`
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if config.embedding_dimensions == 0 {
            return Err(RagError::Config(
                "embedding_dimensions must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.similarity_threshold) {
            return Err(RagError::Config(format!(
                "similarity_threshold ({}) must be within [0, 1]",
                config.similarity_threshold
            )));
        }
        if config.max_tokens == 0 {
            return Err(RagError::Config("max_tokens must be greater than zero".to_string()));
        }
        Ok(config)
    }
}
