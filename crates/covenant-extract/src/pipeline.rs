//! End-to-end contract pipeline
//!
//! Composes the stages: extraction-method selection, normalization,
//! chunking, per-chunk clause orchestration, and aggregation. One document
//! in, one [`ContractRecord`] out; a batch runs documents concurrently under
//! a document-level limit while all generation calls share one global
//! in-flight cap.
//!
//! Failure scoping: a document whose text cannot be extracted is skipped
//! and reported, and the batch continues. Within a document, failed
//! attempts degrade the record (missing spans, missing summary) without
//! discarding it.

use crate::aggregate::ResultAggregator;
use crate::chunking::Chunker;
use crate::config::PipelineConfig;
use crate::error::{ExtractionFailure, PipelineError};
use crate::normalize::TextNormalizer;
use crate::orchestrator::ClauseExtractionOrchestrator;
use crate::select::ExtractionSelector;
use covenant_domain::{
    ClauseType, ContractRecord, ExtractionMethod, GenerationProvider, RawDocument,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// The composed pipeline. Cheap to share behind an [`Arc`]; all state is
/// immutable after construction.
pub struct ContractPipeline {
    config: PipelineConfig,
    selector: ExtractionSelector,
    normalizer: TextNormalizer,
    chunker: Chunker,
    orchestrator: ClauseExtractionOrchestrator,
    aggregator: ResultAggregator,
}

impl ContractPipeline {
    /// Build a pipeline with the default extraction method set
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        Self::with_methods(provider, config, ExtractionSelector::default_methods())
    }

    /// Build a pipeline with a custom extraction method set
    pub fn with_methods(
        provider: Arc<dyn GenerationProvider>,
        config: PipelineConfig,
        methods: Vec<Box<dyn ExtractionMethod>>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let limiter = Arc::new(Semaphore::new(config.max_inflight_calls));
        Ok(Self {
            selector: ExtractionSelector::new(methods, config.min_quality_score),
            normalizer: TextNormalizer::new(config.furniture_page_fraction),
            chunker: Chunker::new(
                config.max_chunk_size,
                config.chunk_overlap,
                config.boundary_window,
            ),
            orchestrator: ClauseExtractionOrchestrator::new(
                Arc::clone(&provider),
                limiter,
                &config,
            ),
            aggregator: ResultAggregator::new(provider, &config),
            config,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one document end to end.
    ///
    /// Only unusable raw text is fatal to the document; every later failure
    /// degrades the record instead.
    pub async fn process_document(
        &self,
        raw: &RawDocument,
    ) -> Result<ContractRecord, ExtractionFailure> {
        let selected = self.selector.select(&raw.id, &raw.bytes)?;
        info!(
            document = %raw.id,
            method = %selected.method,
            score = selected.score,
            "text extracted"
        );

        let normalized = self.normalizer.normalize(&selected.text);
        let chunks = self.chunker.split(&raw.id, &normalized);
        info!(document = %raw.id, chunks = chunks.len(), bytes = normalized.len(), "text chunked");

        let attempts = self.orchestrator.extract_all(&chunks).await;
        let record = self.aggregator.aggregate(&raw.id, &normalized, &attempts).await;

        info!(
            document = %raw.id,
            found = record.found_count(),
            summary = record.summary.is_some(),
            "document processed"
        );
        Ok(record)
    }

    /// Process a batch of documents concurrently.
    ///
    /// At most `document_concurrency` documents run at once. A failed
    /// document is reported in the batch report and never aborts the rest.
    pub async fn run_batch(self: Arc<Self>, documents: Vec<RawDocument>) -> BatchReport {
        let total = documents.len();
        let limiter = Arc::new(Semaphore::new(self.config.document_concurrency));
        let mut tasks = JoinSet::new();

        for document in documents {
            let pipeline = Arc::clone(&self);
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move {
                // The limiter lives as long as the batch; closure would mean
                // the batch itself is being torn down
                let _permit = match limiter.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return Err(ExtractionFailure::new(
                            document.id.clone(),
                            "batch limiter closed before the document started",
                        ));
                    }
                };
                pipeline.process_document(&document).await
            });
        }

        let mut records = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(record)) => records.push(record),
                Ok(Err(failure)) => {
                    warn!(document = %failure.document, reason = %failure.reason, "document skipped");
                    failures.push(failure);
                }
                Err(join_error) => {
                    warn!(%join_error, "document task did not complete");
                }
            }
        }

        // Completion order depends on scheduling; report in document order
        records.sort_by(|a, b| a.document.as_str().cmp(b.document.as_str()));
        failures.sort_by(|a, b| a.document.as_str().cmp(b.document.as_str()));

        info!(
            total,
            succeeded = records.len(),
            failed = failures.len(),
            "batch complete"
        );
        BatchReport { records, failures }
    }
}

/// Outcome of a batch run: per-document records plus the documents that
/// were skipped, both in document order
#[derive(Debug)]
pub struct BatchReport {
    /// Successfully processed documents
    pub records: Vec<ContractRecord>,

    /// Documents skipped because no usable text was extracted
    pub failures: Vec<ExtractionFailure>,
}

impl BatchReport {
    /// Number of documents submitted
    pub fn total(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    /// How many documents had each clause type found
    pub fn found_counts(&self) -> BTreeMap<ClauseType, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            for (clause_type, clause) in &record.clauses {
                if clause.span.is_found() {
                    *counts.entry(*clause_type).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Mean summary length in words over documents that produced one
    pub fn mean_summary_words(&self) -> f64 {
        let summarized: Vec<usize> = self
            .records
            .iter()
            .filter(|r| r.summary.is_some())
            .map(|r| r.stats.summary_word_count)
            .collect();
        if summarized.is_empty() {
            return 0.0;
        }
        summarized.iter().sum::<usize>() as f64 / summarized.len() as f64
    }
}
