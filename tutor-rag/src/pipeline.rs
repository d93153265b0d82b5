//! Ingestion pipeline: chunk, embed, and index documents.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunking::{BoundaryChunker, Chunker};
use crate::config::RagConfig;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::TextLoader;
use crate::vectorstore::VectorStore;

/// The outcome of a batch ingestion: how much was indexed, and which
/// documents failed.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents fully indexed.
    pub documents_indexed: usize,
    /// Fragments written across all indexed documents.
    pub fragments_indexed: usize,
    /// Per-document failures, in input order.
    pub failures: Vec<DocumentFailure>,
}

/// One document that failed during batch ingestion.
#[derive(Debug)]
pub struct DocumentFailure {
    /// The failing document's id, or its path for files that never loaded.
    pub document: String,
    /// What went wrong.
    pub error: RagError,
}

/// Chunks documents, embeds the fragments, and writes them to the vector
/// store.
///
/// Built once per process via [`IngestionPipelineBuilder`]; cheap to share
/// since the backends sit behind `Arc`.
pub struct IngestionPipeline {
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: RagConfig,
}

/// Builder for [`IngestionPipeline`].
pub struct IngestionPipelineBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Option<Arc<dyn Chunker>>,
    config: RagConfig,
}

impl IngestionPipelineBuilder {
    /// Start a builder from the required backends.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store, chunker: None, config: RagConfig::default() }
    }

    /// Use a specific pipeline configuration.
    pub fn with_config(mut self, config: RagConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom chunking strategy instead of the default
    /// [`BoundaryChunker`].
    pub fn with_chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the pipeline and ensure the target collection exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] for invalid chunking parameters and
    /// [`RagError::IndexUnavailable`] when the collection cannot be
    /// created.
    pub async fn build(self) -> Result<IngestionPipeline> {
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(BoundaryChunker::new(
                self.config.chunk_size,
                self.config.chunk_overlap,
            )?),
        };

        self.store
            .create_collection(&self.config.collection_name, self.config.embedding_dimensions)
            .await?;

        Ok(IngestionPipeline {
            chunker,
            embedder: self.embedder,
            store: self.store,
            config: self.config,
        })
    }
}

impl IngestionPipeline {
    /// Start building a pipeline.
    pub fn builder(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::new(embedder, store)
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Ingest one document: chunk, embed, and index its fragments.
    ///
    /// Returns the number of fragments written. A document is either fully
    /// indexed or not indexed at all; a failure partway leaves nothing of
    /// it behind because the upsert is the final step.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] for documents with no
    /// non-whitespace content, plus any embedding or store error.
    pub async fn ingest_document(&self, document: &Document) -> Result<usize> {
        if document.text.trim().is_empty() {
            return Err(RagError::Validation(format!(
                "document '{}' has no content",
                document.id
            )));
        }

        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Err(RagError::Validation(format!(
                "document '{}' produced no fragments",
                document.id
            )));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.store.upsert(&self.config.collection_name, &chunks).await?;

        info!(
            document_id = %document.id,
            fragments = chunks.len(),
            "indexed document"
        );
        Ok(chunks.len())
    }

    /// Ingest a batch of documents with per-document isolation: one
    /// failing document never aborts its siblings.
    pub async fn ingest_documents(&self, documents: &[Document]) -> IngestReport {
        let mut report = IngestReport::default();

        for document in documents {
            match self.ingest_document(document).await {
                Ok(fragments) => {
                    report.documents_indexed += 1;
                    report.fragments_indexed += fragments;
                }
                Err(e) => {
                    error!(document_id = %document.id, error = %e, "failed to ingest document");
                    report.failures.push(DocumentFailure {
                        document: document.id.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            documents = report.documents_indexed,
            fragments = report.fragments_indexed,
            failures = report.failures.len(),
            "batch ingestion finished"
        );
        report
    }

    /// Load and ingest a single file.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let document = TextLoader::new().load_file(path)?;
        self.ingest_document(&document).await
    }

    /// Load and ingest every supported file under a directory.
    ///
    /// Unreadable files are reported as failures keyed by path; the rest
    /// of the batch proceeds.
    pub async fn ingest_dir(&self, dir: &Path) -> IngestReport {
        let (documents, load_failures) = TextLoader::new().load_dir(dir);
        if !load_failures.is_empty() {
            warn!(count = load_failures.len(), "some files failed to load");
        }

        let mut report = self.ingest_documents(&documents).await;
        for (path, error) in load_failures {
            report.failures.push(DocumentFailure { document: path, error });
        }
        report
    }

    /// Drop every fragment from the collection, leaving it empty but
    /// usable.
    pub async fn clear(&self) -> Result<()> {
        self.store.delete_all(&self.config.collection_name).await
    }
}
