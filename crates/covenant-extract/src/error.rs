//! Error types for the pipeline

use covenant_domain::DocumentId;
use thiserror::Error;

/// No extraction method produced usable text for a document.
///
/// Fatal to that document only: the document is skipped and reported, and
/// the batch continues.
#[derive(Error, Debug, Clone)]
#[error("no usable text extracted from '{document}': {reason}")]
pub struct ExtractionFailure {
    /// The document that failed
    pub document: DocumentId,

    /// Why every method was rejected
    pub reason: String,
}

impl ExtractionFailure {
    /// Create an extraction failure
    pub fn new(document: DocumentId, reason: impl Into<String>) -> Self {
        Self {
            document,
            reason: reason.into(),
        }
    }
}

/// Shape validation failure for a generation response.
///
/// Always permanent for the attempt that produced it; the attempt is
/// recorded as failed and the document proceeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The response was empty after cleanup
    #[error("empty response")]
    Empty,

    /// A span exceeded the configured maximum length
    #[error("span too long: {len} chars (max: {max})")]
    SpanTooLong {
        /// Observed span length
        len: usize,
        /// Configured maximum
        max: usize,
    },
}

/// Errors that abort pipeline construction or a whole run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Document-level extraction failure
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
}
