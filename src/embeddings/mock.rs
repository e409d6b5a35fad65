//! Deterministic embedding provider for tests and demos.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rustc_hash::FxHasher;

use super::{EmbeddingError, EmbeddingProvider};

const DEFAULT_DIMENSION: usize = 16;

/// Hash-derived embeddings: the same text always maps to the same
/// vector, different texts to different ones. No network, no model, no
/// semantics — just a stable geometry for exercising the pipeline.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The vector this provider would return for `text`. Handy when a
    /// test wants to place a node embedding at a known query distance.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        (0..self.dimension)
            .map(|component| {
                let mut hasher = FxHasher::default();
                text.hash(&mut hasher);
                component.hash(&mut hasher);
                // Spread the hash over [-1, 1).
                ((hasher.finish() % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "quarterly revenue audit".to_string(),
            "inventory valuation".to_string(),
            "quarterly revenue audit".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2], "identical text, identical vector");
        assert_ne!(first[0], first[1], "different text, different vector");
        assert_eq!(first[0].len(), provider.dimension());
    }

    #[tokio::test]
    async fn single_embed_matches_batch() {
        let provider = MockEmbeddingProvider::with_dimension(8);
        let single = provider.embed("going concern").await.unwrap();
        assert_eq!(single, provider.vector_for("going concern"));
        assert_eq!(single.len(), 8);
    }
}
