//! Covenant Domain Layer
//!
//! Core data model and capability traits for the Covenant contract-analysis
//! pipeline. This crate defines the fundamental concepts (documents, chunks,
//! clause records) and the trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **ClauseType**: the fixed set of legal categories targeted for extraction
//! - **ClauseSpan**: a tagged value distinguishing an extracted span from
//!   explicit absence - absence is never an empty string
//! - **Chunk**: a bounded slice of a document's normalized text, overlapping
//!   its neighbors so a clause is never lost at a boundary
//! - **ContractRecord**: the immutable per-document output of the pipeline
//! - **CallError**: the transient/permanent error taxonomy for external calls
//!
//! ## Architecture
//!
//! - Pure data model and trait definitions only
//! - Capability implementations (HTTP providers, PDF extraction, the vector
//!   index) live in other crates
//! - No process-wide mutable state; configuration is passed into constructors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod clause;
pub mod document;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use chunk::Chunk;
pub use clause::{count_words, ClauseRecord, ClauseSpan, ClauseType, ContractRecord, DocumentStats};
pub use document::{DocumentId, RawDocument};
pub use error::CallError;
pub use traits::{EmbeddingProvider, ExtractionMethod, GenerationProvider, MethodError, Prompt};
