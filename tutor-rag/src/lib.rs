//! Retrieval-augmented question answering over indexed study material.
//!
//! The pipeline has two halves. The write path splits documents into
//! overlapping fragments, embeds them, and writes them to a vector store
//! ([`IngestionPipeline`]). The read path embeds a query, searches the
//! store, filters by similarity threshold, formats the surviving
//! fragments into a context blob, and has a language model answer from
//! that context with per-source attribution ([`RetrievalService`],
//! [`AnswerService`]).
//!
//! Backends are trait objects selected by configuration:
//! [`EmbeddingProvider`], [`VectorStore`], and the `Llm` trait from
//! `tutor-model`. The in-memory store and the hashing embedder make the
//! whole pipeline runnable offline, which is how the tests exercise it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tutor_rag::{
//!     AnswerService, HashingEmbedder, IngestionPipeline, InMemoryVectorStore,
//!     QueryOptions, RagConfig, RetrievalService,
//! };
//! use tutor_model::MockLlm;
//!
//! let config = RagConfig::default();
//! let embedder = Arc::new(HashingEmbedder::new(config.embedding_dimensions));
//! let store = Arc::new(InMemoryVectorStore::new());
//!
//! let pipeline = IngestionPipeline::builder(embedder.clone(), store.clone())
//!     .with_config(config.clone())
//!     .build()
//!     .await?;
//! pipeline.ingest_documents(&documents).await;
//!
//! let retrieval = RetrievalService::new(embedder, store, config);
//! let service = AnswerService::new(retrieval, Arc::new(MockLlm::echo()));
//! let response = service.answer("what is photosynthesis?", &QueryOptions::default()).await?;
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod mock;
pub mod pipeline;
pub mod reranker;
pub mod retrieval;
pub mod session;
pub mod vectorstore;

#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use answer::{
    AnswerService, NO_CONTEXT_ANSWER, QueryOptions, STREAM_ERROR_TOKEN, StreamingAnswer,
};
pub use chunking::{BoundaryChunker, Chunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, Document, IndexStats, QueryResponse, SearchResult, SourceAttribution,
    cosine_similarity,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::TextLoader;
pub use mock::{FailingEmbedder, HashingEmbedder};
pub use pipeline::{DocumentFailure, IngestReport, IngestionPipeline, IngestionPipelineBuilder};
pub use reranker::{NoopReranker, Reranker, SimilarityLengthReranker};
pub use retrieval::{RetrievalOutcome, RetrievalService, RetrievedContext};
pub use session::Session;
pub use vectorstore::{MetadataFilter, UPSERT_BATCH_SIZE, VectorStore};

#[cfg(feature = "ollama")]
pub use ollama::OllamaEmbedder;
#[cfg(feature = "openai")]
pub use openai::OpenAiEmbedder;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
