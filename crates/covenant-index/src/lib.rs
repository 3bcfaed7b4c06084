//! Covenant Clause Index
//!
//! Optional embedding-based similarity search over extracted clause spans.
//!
//! # Architecture
//!
//! ```text
//! ContractRecord → ClauseIndex → EmbeddingProvider → VectorIndex (HNSW)
//!                       ↑
//!                 free-text query
//! ```
//!
//! The index is in-memory and rebuildable from a batch of contract records.
//! Only found clause spans are embedded; absence markers never enter the
//! index, so a query can only ever surface real contract text.
//!
//! # Example Usage
//!
//! ```
//! use covenant_index::{ClauseIndex, MockEmbeddingModel, DEFAULT_TOP_K};
//! use covenant_llm::RetryPolicy;
//! use covenant_domain::{ClauseType, DocumentId};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let index = ClauseIndex::new(Arc::new(MockEmbeddingModel::new(64)), RetryPolicy::default());
//!
//! index
//!     .insert(
//!         &DocumentId::new("msa_2024"),
//!         ClauseType::Termination,
//!         "Either party may terminate upon thirty days written notice.",
//!     )
//!     .await
//!     .unwrap();
//!
//! let hits = index.query("notice period for termination", DEFAULT_TOP_K).await.unwrap();
//! assert_eq!(hits.len(), 1);
//! # });
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod search;
pub mod vector_index;

pub use embedding::{cosine_similarity, MockEmbeddingModel};
pub use search::{
    ClauseIndex, EmbeddingRecord, IndexError, SearchHit, DEFAULT_EF_SEARCH, DEFAULT_TOP_K,
};
pub use vector_index::{VectorIndex, VectorIndexError};
