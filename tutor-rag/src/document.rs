//! Data types for documents, fragments, search results, and answers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key for the originating file path.
pub const META_SOURCE: &str = "source";
/// Metadata key for the originating file name.
pub const META_FILE_NAME: &str = "file_name";
/// Metadata key for the originating file type (extension).
pub const META_FILE_TYPE: &str = "file_type";
/// Metadata key for a fragment's position within its document.
pub const META_CHUNK_INDEX: &str = "chunk_index";
/// Metadata key for a fragment's text length.
pub const META_CHUNK_SIZE: &str = "chunk_size";
/// Metadata key for the study topic a document belongs to.
pub const META_TOPIC: &str = "topic";

/// A source document: raw text plus metadata, owned by the ingestion
/// pipeline until it has been chunked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The raw text content.
    pub text: String,
    /// Key-value metadata (at minimum `file_name` and `file_type` for
    /// file-backed documents).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with a fresh v4 UUID.
    pub fn new(text: impl Into<String>, metadata: HashMap<String, String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), text: text.into(), metadata }
    }
}

/// A bounded slice of a [`Document`]'s text, the unit of indexing and
/// retrieval.
///
/// The embedding is empty until a provider populates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier unique within the index (`{document_id}_{index}`).
    pub id: String,
    /// The fragment text.
    pub text: String,
    /// The vector embedding for this fragment's text.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus fragment fields.
    pub metadata: HashMap<String, String>,
    /// The id of the owning [`Document`].
    pub document_id: String,
    /// Zero-based position among the document's fragments.
    pub chunk_index: usize,
}

/// A retrieved [`Chunk`] paired with its relevance to a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved fragment. Its embedding is not round-tripped by
    /// every backend and may be empty.
    pub chunk: Chunk,
    /// Cosine similarity in `[0, 1]`, or `None` if the backend does not
    /// report distances. Approximate, not a probability.
    pub similarity: Option<f32>,
    /// Zero-based relevance rank (0 is most similar).
    pub rank: usize,
}

/// One attributed source in a [`QueryResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceAttribution {
    /// The originating file name.
    pub file: String,
    /// Similarity of the underlying fragment to the query.
    pub similarity: f32,
    /// A short content preview, truncated to a fixed budget.
    pub preview: String,
}

/// The answer to one query, with per-source attribution.
///
/// Produced once per query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The generated answer text.
    pub answer: String,
    /// Attributed sources in final rank order. Never merged or
    /// deduplicated, even when two fragments share a file.
    pub sources: Vec<SourceAttribution>,
    /// Arithmetic mean of the source similarities. Signals retrieval
    /// quality, not factual correctness. `0.0` when no sources were used.
    pub confidence: f32,
}

/// Collection statistics reported by [`stats`](crate::VectorStore::stats).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexStats {
    /// The collection name.
    pub collection: String,
    /// Number of fragments currently stored.
    pub fragments: usize,
    /// Where the collection lives (a path, URL, or `"memory"`).
    pub location: String,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -0.5, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
