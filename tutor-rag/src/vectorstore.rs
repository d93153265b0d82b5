//! Vector store trait: the abstraction over the persistent index engine.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, IndexStats, SearchResult};
use crate::error::Result;

/// Fragments per upsert call sent to the backend. Bounds memory and
/// request size; any batch size >= 1 is correct.
pub const UPSERT_BATCH_SIZE: usize = 100;

/// An equality filter over fragment metadata: a fragment matches when its
/// metadata contains every listed key with the listed value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataFilter {
    /// Required key-value pairs.
    pub equals: HashMap<String, String>,
}

impl MetadataFilter {
    /// Create a filter requiring a single key-value pair.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut equals = HashMap::new();
        equals.insert(key.into(), value.into());
        Self { equals }
    }

    /// Add a required key-value pair.
    pub fn and(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    /// Whether the given metadata satisfies this filter.
    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        self.equals.iter().all(|(k, v)| metadata.get(k) == Some(v))
    }
}

/// A storage backend for fragment vectors with cosine similarity search.
///
/// Implementations manage named collections of [`Chunk`]s. The collection
/// exclusively owns persisted fragment data; pipeline components hold
/// only transient copies. A collection's dimensionality is fixed at
/// creation and every write is checked against it.
///
/// Concurrency: writers are serialized internally; readers may run during
/// a write and observe either the pre- or post-write state, but never a
/// partially written fragment.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with the given dimensionality. No-op if
    /// it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Write fragments and their vectors. Batched internally for large
    /// inputs. Idempotent per fragment id: re-upserting an id replaces
    /// the prior record.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete all fragments matching the filter.
    async fn delete(&self, collection: &str, filter: &MetadataFilter) -> Result<()>;

    /// Delete every fragment, leaving the collection empty but
    /// immediately usable.
    async fn delete_all(&self, collection: &str) -> Result<()>;

    /// Search for the `top_k` fragments nearest to `embedding`, most
    /// similar first; ties broken by insertion order (earliest first).
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>>;

    /// Fragment count and index identity for observability.
    async fn stats(&self, collection: &str) -> Result<IndexStats>;
}
