//! Property and behavior tests for in-memory vector store search.

use std::collections::HashMap;

use proptest::prelude::*;
use tutor_rag::document::Chunk;
use tutor_rag::inmemory::InMemoryVectorStore;
use tutor_rag::vectorstore::{MetadataFilter, VectorStore};

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| Chunk {
            id,
            text,
            embedding,
            metadata: HashMap::new(),
            document_id: "doc_1".to_string(),
            chunk_index: 0,
        },
    )
}

fn chunk_with(id: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: format!("text for {id}"),
        embedding,
        metadata: HashMap::new(),
        document_id: "doc_1".to_string(),
        chunk_index: 0,
    }
}

mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();

                // Deduplicate by id so upsert replacement does not shrink
                // the expected count.
                let mut deduped: HashMap<String, Chunk> = HashMap::new();
                for chunk in &chunks {
                    deduped.entry(chunk.id.clone()).or_insert_with(|| chunk.clone());
                }
                let unique_chunks: Vec<Chunk> = deduped.into_values().collect();
                let count = unique_chunks.len();

                store.upsert("test", &unique_chunks).await.unwrap();
                let results = store.search("test", &query, top_k, None).await.unwrap();
                (results, count)
            });

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= unique_count);

            for window in results.windows(2) {
                let (a, b) = (window[0].similarity.unwrap(), window[1].similarity.unwrap());
                prop_assert!(a >= b, "results not in descending order: {a} < {b}");
            }
            for (i, result) in results.iter().enumerate() {
                let s = result.similarity.unwrap();
                prop_assert!((0.0..=1.0).contains(&s), "similarity {s} outside [0, 1]");
                prop_assert_eq!(result.rank, i);
            }
        }
    }
}

#[tokio::test]
async fn similarity_ties_break_by_insertion_order() {
    let store = InMemoryVectorStore::new();
    store.create_collection("test", 2).await.unwrap();

    // Same embedding, so identical similarity to any query.
    let first = chunk_with("first", vec![1.0, 0.0]);
    let second = chunk_with("second", vec![1.0, 0.0]);
    store.upsert("test", &[first, second]).await.unwrap();

    let results = store.search("test", &[1.0, 0.0], 2, None).await.unwrap();
    assert_eq!(results[0].chunk.id, "first");
    assert_eq!(results[1].chunk.id, "second");
}

#[tokio::test]
async fn reupserting_replaces_instead_of_duplicating() {
    let store = InMemoryVectorStore::new();
    store.create_collection("test", 2).await.unwrap();

    store.upsert("test", &[chunk_with("a", vec![1.0, 0.0])]).await.unwrap();
    let mut updated = chunk_with("a", vec![0.0, 1.0]);
    updated.text = "updated".to_string();
    store.upsert("test", &[updated]).await.unwrap();

    let stats = store.stats("test").await.unwrap();
    assert_eq!(stats.fragments, 1);

    let results = store.search("test", &[0.0, 1.0], 5, None).await.unwrap();
    assert_eq!(results[0].chunk.text, "updated");
}

#[tokio::test]
async fn replaced_fragment_keeps_its_tie_break_position() {
    let store = InMemoryVectorStore::new();
    store.create_collection("test", 2).await.unwrap();

    store
        .upsert("test", &[chunk_with("a", vec![1.0, 0.0]), chunk_with("b", vec![1.0, 0.0])])
        .await
        .unwrap();
    // Replacing "a" must not move it behind "b" in tie order.
    store.upsert("test", &[chunk_with("a", vec![1.0, 0.0])]).await.unwrap();

    let results = store.search("test", &[1.0, 0.0], 2, None).await.unwrap();
    assert_eq!(results[0].chunk.id, "a");
}

#[tokio::test]
async fn dimension_mismatch_is_rejected() {
    let store = InMemoryVectorStore::new();
    store.create_collection("test", 3).await.unwrap();

    let err = store.upsert("test", &[chunk_with("a", vec![1.0, 0.0])]).await.unwrap_err();
    assert!(matches!(
        err,
        tutor_rag::RagError::DimensionMismatch { expected: 3, actual: 2 }
    ));
}

#[tokio::test]
async fn delete_all_leaves_collection_usable() {
    let store = InMemoryVectorStore::new();
    store.create_collection("test", 2).await.unwrap();
    store.upsert("test", &[chunk_with("a", vec![1.0, 0.0])]).await.unwrap();

    store.delete_all("test").await.unwrap();
    assert_eq!(store.stats("test").await.unwrap().fragments, 0);

    // Still writable without recreating the collection.
    store.upsert("test", &[chunk_with("b", vec![0.0, 1.0])]).await.unwrap();
    assert_eq!(store.stats("test").await.unwrap().fragments, 1);
}

#[tokio::test]
async fn metadata_filter_narrows_search_and_delete() {
    let store = InMemoryVectorStore::new();
    store.create_collection("test", 2).await.unwrap();

    let mut biology = chunk_with("bio", vec![1.0, 0.0]);
    biology.metadata.insert("topic".to_string(), "biology".to_string());
    let mut history = chunk_with("hist", vec![1.0, 0.0]);
    history.metadata.insert("topic".to_string(), "history".to_string());
    store.upsert("test", &[biology, history]).await.unwrap();

    let filter = MetadataFilter::equals("topic", "biology");
    let results = store.search("test", &[1.0, 0.0], 5, Some(&filter)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.id, "bio");

    store.delete("test", &filter).await.unwrap();
    let remaining = store.search("test", &[1.0, 0.0], 5, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].chunk.id, "hist");
}

#[tokio::test]
async fn missing_collection_is_index_unavailable() {
    let store = InMemoryVectorStore::new();
    let err = store.search("absent", &[1.0], 5, None).await.unwrap_err();
    assert!(matches!(err, tutor_rag::RagError::IndexUnavailable { .. }));
}
