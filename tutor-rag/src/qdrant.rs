//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`], the durable [`VectorStore`] backend,
//! implemented with the [qdrant-client](https://docs.rs/qdrant-client)
//! crate over gRPC. Collections use cosine distance, fixed for the
//! collection's lifetime; Qdrant reports cosine scores directly, which
//! are clamped into `[0, 1]` as the similarity.
//!
//! This module is only available when the `qdrant` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use tutor_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334")?;
//! store.create_collection("docs", 384).await?;
//! store.upsert("docs", &chunks).await?;
//! let results = store.search("docs", &query, 5, None).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;
use uuid::Uuid;

use crate::document::{Chunk, IndexStats, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{MetadataFilter, UPSERT_BATCH_SIZE, VectorStore};

/// A durable [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Fragment text, metadata, and ownership are stored as point payload, so
/// the collection survives process restarts. Similarity ties are ordered
/// by the engine, not by insertion order.
pub struct QdrantVectorStore {
    client: Qdrant,
    url: String,
}

impl QdrantVectorStore {
    /// Create a new store connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client, url: url.to_string() })
    }

    /// Create a new store with the default URL (`http://localhost:6334`).
    pub fn default_url() -> Result<Self> {
        Self::new("http://localhost:6334")
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::IndexUnavailable { backend: "qdrant".to_string(), message: e.to_string() }
    }

    /// Translate a [`MetadataFilter`] into a Qdrant payload filter.
    fn to_qdrant_filter(filter: &MetadataFilter) -> Filter {
        Filter::must(
            filter
                .equals
                .iter()
                .map(|(k, v)| Condition::matches(format!("metadata.{k}"), v.clone()))
                .collect::<Vec<_>>(),
        )
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_integer(value: &QdrantValue) -> Option<i64> {
        match &value.kind {
            Some(Kind::IntegerValue(n)) => Some(*n),
            _ => None,
        }
    }

    fn to_point(chunk: &Chunk) -> PointStruct {
        let mut payload_map = serde_json::Map::new();
        payload_map.insert("id".to_string(), serde_json::Value::String(chunk.id.clone()));
        payload_map.insert("text".to_string(), serde_json::Value::String(chunk.text.clone()));
        payload_map.insert(
            "document_id".to_string(),
            serde_json::Value::String(chunk.document_id.clone()),
        );
        payload_map.insert(
            "chunk_index".to_string(),
            serde_json::Value::Number(chunk.chunk_index.into()),
        );
        let metadata_obj: serde_json::Map<String, serde_json::Value> = chunk
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        payload_map.insert("metadata".to_string(), serde_json::Value::Object(metadata_obj));

        let payload =
            Payload::try_from(serde_json::Value::Object(payload_map)).unwrap_or_default();

        PointStruct::new(point_uuid(&chunk.id), chunk.embedding.clone(), payload)
    }
}

/// Qdrant only accepts unsigned integers or UUIDs as point IDs, while
/// fragment ids are `{document_id}_{index}` strings. Hash the fragment id
/// into a deterministic v5 UUID so re-upserting the same fragment still
/// replaces its point; the original id travels in the payload.
fn point_uuid(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        if collections.collections.iter().any(|c| c.name == name) {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        for batch in chunks.chunks(UPSERT_BATCH_SIZE) {
            let points: Vec<PointStruct> = batch.iter().map(Self::to_point).collect();
            self.client
                .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
                .await
                .map_err(Self::map_err)?;
        }

        debug!(collection, count = chunks.len(), "upserted fragments to qdrant");
        Ok(())
    }

    async fn delete(&self, collection: &str, filter: &MetadataFilter) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(Self::to_qdrant_filter(filter))
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection, "deleted fragments matching filter from qdrant");
        Ok(())
    }

    async fn delete_all(&self, collection: &str) -> Result<()> {
        // An empty must-filter matches every point; the collection itself
        // stays in place and remains usable.
        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(Filter::must(Vec::<Condition>::new()))
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection, "deleted all fragments from qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let mut builder = SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
            .with_payload(true);
        if let Some(filter) = filter {
            builder = builder.filter(Self::to_qdrant_filter(filter));
        }

        let response = self.client.search_points(builder).await.map_err(Self::map_err)?;

        Ok(response
            .result
            .into_iter()
            .enumerate()
            .map(|(rank, scored)| {
                let id =
                    scored.payload.get("id").and_then(Self::extract_string).unwrap_or_default();

                let text =
                    scored.payload.get("text").and_then(Self::extract_string).unwrap_or_default();

                let document_id = scored
                    .payload
                    .get("document_id")
                    .and_then(Self::extract_string)
                    .unwrap_or_default();

                let chunk_index = scored
                    .payload
                    .get("chunk_index")
                    .and_then(Self::extract_integer)
                    .unwrap_or_default() as usize;

                let metadata: HashMap<String, String> = scored
                    .payload
                    .get("metadata")
                    .and_then(|v| match &v.kind {
                        Some(Kind::StructValue(s)) => Some(
                            s.fields
                                .iter()
                                .filter_map(|(k, v)| {
                                    Self::extract_string(v).map(|s| (k.clone(), s))
                                })
                                .collect(),
                        ),
                        _ => None,
                    })
                    .unwrap_or_default();

                SearchResult {
                    chunk: Chunk {
                        id,
                        text,
                        embedding: Vec::new(),
                        metadata,
                        document_id,
                        chunk_index,
                    },
                    similarity: Some(scored.score.clamp(0.0, 1.0)),
                    rank,
                }
            })
            .collect())
    }

    async fn stats(&self, collection: &str) -> Result<IndexStats> {
        let info = self.client.collection_info(collection).await.map_err(Self::map_err)?;
        let fragments =
            info.result.and_then(|r| r.points_count).unwrap_or_default() as usize;

        Ok(IndexStats {
            collection: collection.to_string(),
            fragments,
            location: self.url.clone(),
        })
    }
}
