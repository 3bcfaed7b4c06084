//! Hash-based embedding model
//!
//! A deterministic, offline implementation of the embedding capability for
//! tests and for running the pipeline without an embedding service. The
//! vectors carry no semantic signal; they are stable, unit-length, and
//! diverse across inputs, which is all the index plumbing needs.

use async_trait::async_trait;
use covenant_domain::{CallError, EmbeddingProvider};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic hash-based embedding model.
///
/// # Examples
///
/// ```
/// use covenant_index::MockEmbeddingModel;
/// use covenant_domain::EmbeddingProvider;
///
/// # tokio_test::block_on(async {
/// let model = MockEmbeddingModel::new(64);
/// let a = model.embed("termination clause").await.unwrap();
/// let b = model.embed("termination clause").await.unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// # });
/// ```
pub struct MockEmbeddingModel {
    dimension: usize,
}

impl MockEmbeddingModel {
    /// Create a model producing vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Hash the text with a per-component seed into [-1, 1]
    fn hash_with_seed(text: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        seed.hash(&mut hasher);
        let value = hasher.finish();
        ((value as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CallError> {
        if text.is_empty() {
            return Err(CallError::InvalidRequest(
                "empty text cannot be embedded".to_string(),
            ));
        }

        let mut embedding: Vec<f32> = (0..self.dimension)
            .map(|i| Self::hash_with_seed(text, i as u64))
            .collect();

        // Unit length so cosine similarity behaves
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns a value in [-1, 1]; zero when either vector has zero magnitude.
///
/// # Panics
///
/// Panics if the vectors have different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vectors must have the same length");

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let model = MockEmbeddingModel::new(128);

        let a = model.embed("the receiving party shall hold").await.unwrap();
        let b = model.embed("the receiving party shall hold").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
        assert_eq!(model.dimension(), 128);

        let magnitude: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let model = MockEmbeddingModel::new(128);
        let a = model.embed("termination for convenience").await.unwrap();
        let b = model.embed("limitation of liability").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let model = MockEmbeddingModel::new(128);
        assert!(matches!(
            model.embed("").await,
            Err(CallError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_cosine_similarity_extremes() {
        let x = vec![1.0, 0.0, 0.0];
        let y = vec![0.0, 1.0, 0.0];
        let neg_x = vec![-1.0, 0.0, 0.0];

        assert!((cosine_similarity(&x, &x) - 1.0).abs() < 1e-4);
        assert!(cosine_similarity(&x, &y).abs() < 1e-4);
        assert!((cosine_similarity(&x, &neg_x) + 1.0).abs() < 1e-4);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
