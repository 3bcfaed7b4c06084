//! Clause similarity search
//!
//! Indexes extracted clause spans as embedding vectors and answers
//! free-text similarity queries over them. Only found spans are indexed:
//! not-found markers never enter the index.
//!
//! Indexing and querying share the pipeline's retry discipline - every
//! embedding call goes through a [`RetryingCaller`].

use crate::vector_index::{VectorIndex, VectorIndexError};
use covenant_domain::{CallError, ClauseType, ContractRecord, DocumentId, EmbeddingProvider};
use covenant_llm::{RetryPolicy, RetryingCaller};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of hits returned by a query
pub const DEFAULT_TOP_K: usize = 5;

/// Default HNSW search-quality parameter
pub const DEFAULT_EF_SEARCH: usize = 64;

/// Errors from clause index operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// The embedding capability failed permanently
    #[error(transparent)]
    Call(#[from] CallError),

    /// A vector did not match the index dimension
    #[error(transparent)]
    Index(#[from] VectorIndexError),
}

/// What was indexed for one clause span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingRecord {
    /// Document the span came from
    pub document: DocumentId,

    /// Clause category of the span
    pub clause_type: ClauseType,

    /// The span text that was embedded
    pub text: String,
}

/// One query result
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The indexed clause span
    pub record: EmbeddingRecord,

    /// Cosine similarity to the query, in [-1, 1]
    pub similarity: f32,
}

/// Embedding index over extracted clause spans.
///
/// Inserts are single-writer; queries share read access to the index and
/// the record map and run concurrently with each other.
pub struct ClauseIndex {
    provider: Arc<dyn EmbeddingProvider>,
    caller: RetryingCaller,
    index: VectorIndex,
    records: RwLock<HashMap<usize, EmbeddingRecord>>,
}

impl ClauseIndex {
    /// Create an index sized to the provider's embedding dimension
    pub fn new(provider: Arc<dyn EmbeddingProvider>, retry: RetryPolicy) -> Self {
        let index = VectorIndex::new(provider.dimension());
        Self {
            provider,
            caller: RetryingCaller::new(retry),
            index,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Index every found clause span of a contract record.
    ///
    /// Returns the number of spans indexed. A span whose embedding fails
    /// permanently is skipped with a warning; the rest of the record still
    /// lands in the index.
    pub async fn index_contract(&self, record: &ContractRecord) -> usize {
        let mut indexed = 0;
        for clause in record.clauses.values() {
            let Some(text) = clause.span.as_text() else {
                continue;
            };
            match self.insert(&record.document, clause.clause_type, text).await {
                Ok(()) => indexed += 1,
                Err(error) => {
                    warn!(
                        document = %record.document,
                        clause_type = %clause.clause_type,
                        %error,
                        "clause span not indexed"
                    );
                }
            }
        }
        debug!(document = %record.document, indexed, "contract indexed");
        indexed
    }

    /// Embed and index one clause span
    pub async fn insert(
        &self,
        document: &DocumentId,
        clause_type: ClauseType,
        text: &str,
    ) -> Result<(), IndexError> {
        let embedding = self.caller.call(|| self.provider.embed(text)).await?;
        let internal_id = self.index.add(&embedding)?;
        self.records.write().unwrap().insert(
            internal_id,
            EmbeddingRecord {
                document: document.clone(),
                clause_type,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    /// Find the clause spans most similar to a free-text query, best first
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.caller.call(|| self.provider.embed(text)).await?;
        let neighbours = self.index.search(&embedding, top_k, DEFAULT_EF_SEARCH)?;

        let records = self.records.read().unwrap();
        let mut hits: Vec<SearchHit> = neighbours
            .into_iter()
            .filter_map(|(internal_id, similarity)| {
                records.get(&internal_id).map(|record| SearchHit {
                    record: record.clone(),
                    similarity,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Number of indexed spans
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
