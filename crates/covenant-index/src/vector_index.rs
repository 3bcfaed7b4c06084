//! HNSW vector index
//!
//! In-memory approximate nearest-neighbor index over embedding vectors,
//! using cosine distance. The index hands out dense internal ids on insert;
//! the layer above maps those ids back to clause records.

use hnsw_rs::prelude::*;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 1_000_000;

/// Vector index errors
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// A vector did not match the index dimension
    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was built for
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },
}

/// An HNSW index over fixed-dimension vectors.
///
/// Insertions return sequential internal ids starting at 0. Searches return
/// (internal id, cosine similarity) pairs, best first.
///
/// Inserts take the write lock one at a time; searches share the read lock,
/// so concurrent queries never serialize against each other.
pub struct VectorIndex {
    dimension: usize,
    hnsw: Arc<RwLock<Hnsw<'static, f32, DistCosine>>>,
    next_id: Arc<Mutex<usize>>,
}

impl VectorIndex {
    /// Create an index for vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            DEFAULT_MAX_ELEMENTS,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );

        Self {
            dimension,
            hnsw: Arc::new(RwLock::new(hnsw)),
            next_id: Arc::new(Mutex::new(0)),
        }
    }

    /// The dimension this index accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Insert a vector, returning its internal id
    pub fn add(&self, embedding: &[f32]) -> Result<usize, VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let mut next_id = self.next_id.lock().unwrap();
        let internal_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let embedding_vec = embedding.to_vec();
        let hnsw = self.hnsw.write().unwrap();
        hnsw.insert((&embedding_vec, internal_id));

        Ok(internal_id)
    }

    /// Find the `k` nearest vectors to `query`.
    ///
    /// `ef_search` trades recall for speed; higher is more accurate. HNSW
    /// reports cosine distance, which is converted to similarity here.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let hnsw = self.hnsw.read().unwrap();
        let neighbours = hnsw.search(query, k, ef_search);

        Ok(neighbours
            .into_iter()
            .map(|n| (n.d_id, 1.0 - n.distance))
            .collect())
    }

    /// Number of vectors inserted
    pub fn len(&self) -> usize {
        *self.next_id.lock().unwrap()
    }

    /// Whether the index holds no vectors
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let index = VectorIndex::new(3);
        assert!(index.is_empty());
        assert_eq!(index.add(&[1.0, 0.0, 0.0]).unwrap(), 0);
        assert_eq!(index.add(&[0.0, 1.0, 0.0]).unwrap(), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let index = VectorIndex::new(4);
        assert!(matches!(
            index.add(&[0.1; 3]),
            Err(VectorIndexError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert!(index.search(&[0.1; 5], 1, 64).is_err());
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = VectorIndex::new(3);
        let x = index.add(&[1.0, 0.0, 0.0]).unwrap();
        let y = index.add(&[0.0, 1.0, 0.0]).unwrap();
        let diagonal = index.add(&[0.7071, 0.7071, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 3, 64).unwrap();
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].0, x);
        assert!(results[0].1 > 0.99);
        assert_eq!(results[1].0, diagonal);
        assert!(results[1].1 > 0.5);
        assert_eq!(results[2].0, y);
        assert!(results[2].1 < 0.1);
    }

    #[test]
    fn test_searches_proceed_while_inserting() {
        let index = VectorIndex::new(8);
        for i in 0..16 {
            let mut v = [0.0f32; 8];
            v[i % 8] = 1.0;
            index.add(&v).unwrap();
        }

        let query = [1.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let hits = index.search(&query, 3, 64).unwrap();
                        assert!(!hits.is_empty());
                    }
                });
            }
            scope.spawn(|| {
                for i in 0..50 {
                    let mut v = [0.0f32; 8];
                    v[0] = 1.0;
                    v[1] = i as f32 / 50.0;
                    index.add(&v).unwrap();
                }
            });
        });

        assert_eq!(index.len(), 66);
    }
}
