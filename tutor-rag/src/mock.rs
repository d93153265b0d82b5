//! Deterministic in-process embedding providers for tests and offline
//! development.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// A deterministic [`EmbeddingProvider`] that hashes word tokens into a
/// fixed-size bag-of-words vector and L2-normalizes it.
///
/// The same text always maps to the same vector, and texts sharing
/// vocabulary land close together in cosine space, which is enough for
/// pipeline tests without a model backend. Not a semantic embedding.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create a new embedder producing vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimensions as u64) as usize
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(|c| c.to_lowercase())
                .collect();
            if !token.is_empty() {
                vector[self.bucket(&token)] += 1.0;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An [`EmbeddingProvider`] that always fails with a connectivity error,
/// for exercising backend-failure paths.
#[derive(Debug, Clone)]
pub struct FailingEmbedder {
    dimensions: usize,
}

impl FailingEmbedder {
    /// Create a new failing embedder reporting the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding {
            provider: "failing".into(),
            message: "scripted connectivity failure".into(),
            transient: true,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::cosine_similarity;

    #[tokio::test]
    async fn embedding_is_deterministic() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("photosynthesis converts light").await.unwrap();
        let b = embedder.embed("photosynthesis converts light").await.unwrap();
        assert!(cosine_similarity(&a, &b) >= 0.999);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher_than_disjoint() {
        let embedder = HashingEmbedder::new(64);
        let base = embedder.embed("photosynthesis converts light energy").await.unwrap();
        let related = embedder.embed("what does photosynthesis light do").await.unwrap();
        let unrelated = embedder.embed("quarterly revenue tax filing deadline").await.unwrap();

        assert!(
            cosine_similarity(&base, &related) > cosine_similarity(&base, &unrelated),
            "related text should score higher"
        );
    }

    #[tokio::test]
    async fn batch_order_does_not_affect_results() {
        let embedder = HashingEmbedder::new(32);
        let forward = embedder.embed_batch(&["one", "two"]).await.unwrap();
        let reversed = embedder.embed_batch(&["two", "one"]).await.unwrap();
        assert_eq!(forward[0], reversed[1]);
        assert_eq!(forward[1], reversed[0]);
    }
}
