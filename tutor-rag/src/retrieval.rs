//! Retrieval service: query embedding, vector search, threshold
//! filtering, and context formatting.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RagConfig;
use crate::document::{META_FILE_NAME, META_SOURCE, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::reranker::Reranker;
use crate::vectorstore::{MetadataFilter, VectorStore};

/// Queries longer than this are truncated before embedding.
const MAX_QUERY_LEN: usize = 2000;

/// Retrieved fragments plus the formatted context string built from them.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// Search results in final rank order.
    pub results: Vec<SearchResult>,
    /// The formatted context blob for language-model consumption.
    pub context: String,
}

/// The outcome of a retrieval: either relevant fragments were found, or
/// nothing survived the similarity threshold.
///
/// `NoRelevantContext` is an explicit signal, not an empty success, so
/// callers can produce a distinct user-facing message instead of
/// attributing an answer to irrelevant material.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// At least one fragment passed the similarity threshold.
    Found(RetrievedContext),
    /// Every candidate fell below the threshold (or the index is empty).
    NoRelevantContext,
}

/// Orchestrates query embedding, vector search, threshold filtering, and
/// optional reranking.
pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    reranker: Option<Arc<dyn Reranker>>,
    config: RagConfig,
}

impl RetrievalService {
    /// Create a new retrieval service.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, store, reranker: None, config }
    }

    /// Attach a reranker applied after threshold filtering.
    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Retrieve relevant fragments for a query and format them as a
    /// context blob.
    ///
    /// Candidates whose similarity is below the configured threshold (or
    /// unreported) are discarded; if nothing survives, the outcome is
    /// [`RetrievalOutcome::NoRelevantContext`].
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
        filter: Option<&MetadataFilter>,
    ) -> Result<RetrievalOutcome> {
        let query = sanitize_query(query);
        let top_k = top_k.unwrap_or(self.config.top_k);
        let threshold = self.config.similarity_threshold;

        let query_embedding = self.embedder.embed(&query).await?;

        let candidates = self
            .store
            .search(&self.config.collection_name, &query_embedding, top_k, filter)
            .await?;
        let candidate_count = candidates.len();

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|r| r.similarity.is_some_and(|s| s >= threshold))
            .collect();

        debug!(
            candidates = candidate_count,
            kept = results.len(),
            threshold,
            "filtered candidates by similarity threshold"
        );

        if results.is_empty() {
            info!("no fragment passed the similarity threshold");
            return Ok(RetrievalOutcome::NoRelevantContext);
        }

        if let Some(reranker) = &self.reranker {
            results = reranker.rerank(&query, results).await?;
        }
        for (rank, result) in results.iter_mut().enumerate() {
            result.rank = rank;
        }

        let context = format_context(&results);
        info!(result_count = results.len(), "retrieval completed");

        Ok(RetrievalOutcome::Found(RetrievedContext { results, context }))
    }
}

/// Normalize whitespace and cap the query length before embedding.
pub fn sanitize_query(query: &str) -> String {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_QUERY_LEN) {
        Some((idx, _)) => collapsed[..idx].to_string(),
        None => collapsed,
    }
}

/// Format search results into the context blob given to the language
/// model: one numbered block per source with its similarity percentage,
/// file name, and full fragment text. Sources are never merged or
/// deduplicated, even when two fragments share a file.
pub fn format_context(results: &[SearchResult]) -> String {
    let blocks: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let file = source_file(result);
            let similarity = result.similarity.unwrap_or(0.0) * 100.0;
            format!(
                "Source {} (relevance: {:.1}%):\nFile: {}\nContent: {}\n",
                i + 1,
                similarity,
                file,
                result.chunk.text
            )
        })
        .collect();

    blocks.join("\n")
}

/// The originating file of a result, for attribution.
pub fn source_file(result: &SearchResult) -> String {
    result
        .chunk
        .metadata
        .get(META_FILE_NAME)
        .or_else(|| result.chunk.metadata.get(META_SOURCE))
        .cloned()
        .unwrap_or_else(|| "unknown".to_string())
}
