//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] backs collections with a `HashMap` behind a
//! `tokio::sync::RwLock`: writers are serialized, readers run
//! concurrently, and a reader sees each fragment either before or after
//! a write, never half-written. Suitable for development and tests; the
//! durable backend is [`QdrantVectorStore`](crate::qdrant::QdrantVectorStore).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, IndexStats, SearchResult, cosine_similarity};
use crate::error::{RagError, Result};
use crate::vectorstore::{MetadataFilter, VectorStore};

struct StoredChunk {
    chunk: Chunk,
    /// Monotonic insertion sequence, used to break similarity ties
    /// deterministically (earliest indexed first). Replacing a fragment
    /// keeps its original sequence.
    seq: u64,
}

struct Collection {
    dimensions: usize,
    chunks: HashMap<String, StoredChunk>,
    next_seq: u64,
}

/// An in-memory [`VectorStore`] with deterministic search ordering.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384).await?;
/// store.upsert("docs", &chunks).await?;
/// let results = store.search("docs", &query, 5, None).await?;
/// ```
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(name: &str) -> RagError {
        RagError::IndexUnavailable {
            backend: "memory".to_string(),
            message: format!("collection '{name}' does not exist"),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_insert_with(|| Collection {
            dimensions,
            chunks: HashMap::new(),
            next_seq: 0,
        });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;

        for chunk in chunks {
            if chunk.embedding.len() != store.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: store.dimensions,
                    actual: chunk.embedding.len(),
                });
            }
        }

        for chunk in chunks {
            match store.chunks.get_mut(&chunk.id) {
                Some(existing) => existing.chunk = chunk.clone(),
                None => {
                    let seq = store.next_seq;
                    store.next_seq += 1;
                    store.chunks.insert(chunk.id.clone(), StoredChunk { chunk: chunk.clone(), seq });
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, filter: &MetadataFilter) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        store.chunks.retain(|_, stored| !filter.matches(&stored.chunk.metadata));
        Ok(())
    }

    async fn delete_all(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        store.chunks.clear();
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::missing(collection))?;

        if embedding.len() != store.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: store.dimensions,
                actual: embedding.len(),
            });
        }

        let mut scored: Vec<(f32, u64, &Chunk)> = store
            .chunks
            .values()
            .filter(|stored| filter.is_none_or(|f| f.matches(&stored.chunk.metadata)))
            .map(|stored| {
                let score = cosine_similarity(&stored.chunk.embedding, embedding).clamp(0.0, 1.0);
                (score, stored.seq, &stored.chunk)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (score, _, chunk))| SearchResult {
                chunk: chunk.clone(),
                similarity: Some(score),
                rank,
            })
            .collect())
    }

    async fn stats(&self, collection: &str) -> Result<IndexStats> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::missing(collection))?;
        Ok(IndexStats {
            collection: collection.to_string(),
            fragments: store.chunks.len(),
            location: "memory".to_string(),
        })
    }
}
