//! Covenant Extraction Pipeline
//!
//! Turns raw contract files into structured records: a bounded-length
//! summary plus one extracted span (or explicit absence) per configured
//! clause type.
//!
//! # Architecture
//!
//! ```text
//! RawDocument → ExtractionSelector → TextNormalizer → Chunker
//!             → ClauseExtractionOrchestrator → ResultAggregator → ContractRecord
//! ```
//!
//! Every stage before orchestration is a pure local transform; all
//! suspension happens at the generation-provider boundary, wrapped in
//! retries and bounded by a shared in-flight cap plus a per-document
//! deadline.
//!
//! # Failure scoping
//!
//! - A failed extraction **method** only excludes that method
//! - A failed **attempt** (one chunk, one clause type) only loses that cell
//! - A failed **summary** leaves the clause results intact
//! - A failed **document** is skipped and reported; the batch continues
//!
//! # Example Usage
//!
//! ```
//! use covenant_extract::{ContractPipeline, PipelineConfig};
//! use covenant_domain::{ClauseType, DocumentId, RawDocument};
//! use covenant_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let provider = Arc::new(MockProvider::new("NOT_FOUND"));
//! let pipeline = ContractPipeline::new(provider, PipelineConfig::default()).unwrap();
//!
//! let raw = RawDocument {
//!     id: DocumentId::new("msa_2024"),
//!     bytes: b"This Agreement is made between the parties hereto.".to_vec(),
//! };
//!
//! let record = pipeline.process_document(&raw).await.unwrap();
//! assert_eq!(record.found_count(), 0);
//! assert!(record.clause(ClauseType::Termination).is_some());
//! # });
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod chunking;
pub mod config;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod select;

pub use aggregate::ResultAggregator;
pub use chunking::Chunker;
pub use config::{PipelineConfig, RetrySettings};
pub use error::{ExtractionFailure, PipelineError, ValidationError};
pub use normalize::TextNormalizer;
pub use orchestrator::{
    AttemptMap, AttemptOutcome, ClauseExtractionAttempt, ClauseExtractionOrchestrator,
};
pub use parser::{parse_span_response, SpanResponse};
pub use pipeline::{BatchReport, ContractPipeline};
pub use prompt::PromptBuilder;
pub use select::{ExtractionSelector, LossyTextMethod, PdfTextMethod, SelectedText, Utf8TextMethod};
