//! Reranker trait for reordering search results.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A reranker that reorders search results after vector search.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank search results given the original query.
    ///
    /// Returns the results in a new order. Similarity scores are left
    /// untouched; ranks are reassigned by the caller.
    async fn rerank(&self, query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>>;
}

/// A no-op reranker that returns results unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReranker;

#[async_trait]
impl Reranker for NoopReranker {
    async fn rerank(&self, _query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>> {
        Ok(results)
    }
}

/// Reorders results by a linear combination of similarity and a length
/// heuristic: `0.7 * similarity + 0.3 * length_score`, where
/// `length_score` normalizes the fragment's word count against ten times
/// the query's word count, capped at 1.0.
///
/// This is a heuristic tie-breaker favoring substantial fragments, not a
/// learned reranker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityLengthReranker;

impl SimilarityLengthReranker {
    fn combined_score(query_words: usize, result: &SearchResult) -> f32 {
        let content_words = result.chunk.text.split_whitespace().count();
        let length_score = (content_words as f32 / (query_words * 10) as f32).min(1.0);
        result.similarity.unwrap_or(0.0) * 0.7 + length_score * 0.3
    }
}

#[async_trait]
impl Reranker for SimilarityLengthReranker {
    async fn rerank(
        &self,
        query: &str,
        mut results: Vec<SearchResult>,
    ) -> Result<Vec<SearchResult>> {
        let query_words = query.split_whitespace().count().max(1);
        results.sort_by(|a, b| {
            let score_a = Self::combined_score(query_words, a);
            let score_b = Self::combined_score(query_words, b);
            score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(results)
    }
}
