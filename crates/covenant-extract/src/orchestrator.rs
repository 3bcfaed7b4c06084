//! Per-chunk clause extraction orchestration
//!
//! Fans out one extraction attempt per (chunk, clause type) pair, bounded by
//! a shared in-flight permit, and drives every attempt to a terminal
//! outcome. A failed attempt never aborts its siblings: the attempt map
//! always covers the full cross product, so aggregation can distinguish
//! "the model said absent" from "the call failed".
//!
//! A per-document deadline bounds the whole fan-out. When it expires,
//! outstanding attempts are aborted and recorded as failed.

use crate::config::PipelineConfig;
use crate::parser::{parse_span_response, SpanResponse};
use crate::prompt::PromptBuilder;
use covenant_domain::{CallError, Chunk, ClauseType, DocumentId, GenerationProvider};
use covenant_llm::RetryingCaller;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

/// Terminal outcome of one extraction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The model returned one or more clause spans
    Found {
        /// Spans in response order
        spans: Vec<String>,
    },

    /// The model affirmed the clause is absent from this chunk
    NotPresent,

    /// The call or its response validation failed
    Failed {
        /// Human-readable failure cause
        reason: String,
    },
}

/// One (chunk, clause type) extraction attempt, driven to a terminal state
#[derive(Debug, Clone)]
pub struct ClauseExtractionAttempt {
    /// Owning document
    pub document: DocumentId,

    /// Index of the chunk the attempt ran against
    pub chunk_index: usize,

    /// Clause type the attempt asked about
    pub clause_type: ClauseType,

    /// Provider invocations consumed, retries included
    pub attempts: u32,

    /// Terminal outcome
    pub outcome: AttemptOutcome,
}

/// Terminal attempts keyed by (chunk index, clause type)
pub type AttemptMap = BTreeMap<(usize, ClauseType), ClauseExtractionAttempt>;

/// Drives clause extraction across all chunks of one document
pub struct ClauseExtractionOrchestrator {
    provider: Arc<dyn GenerationProvider>,
    caller: RetryingCaller,
    prompts: PromptBuilder,
    limiter: Arc<Semaphore>,
    clause_types: Vec<ClauseType>,
    min_span_chars: usize,
    max_span_chars: usize,
    temperature: f32,
    max_tokens: u32,
    deadline: Duration,
}

impl ClauseExtractionOrchestrator {
    /// Create an orchestrator. The limiter is shared across documents and
    /// caps in-flight generation calls globally.
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        limiter: Arc<Semaphore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            provider,
            caller: RetryingCaller::new(config.retry.policy()),
            prompts: PromptBuilder::new(),
            limiter,
            clause_types: config.clause_types.clone(),
            min_span_chars: config.min_span_chars,
            max_span_chars: config.max_span_chars,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            deadline: config.document_deadline(),
        }
    }

    /// Run every (chunk, clause type) attempt to a terminal outcome.
    ///
    /// Returns a map covering the full cross product. Attempts still
    /// outstanding when the deadline expires are recorded as failed with a
    /// cancellation reason.
    pub async fn extract_all(&self, chunks: &[Chunk]) -> AttemptMap {
        let mut attempts: AttemptMap = BTreeMap::new();
        let Some(first) = chunks.first() else {
            return attempts;
        };
        let document = first.document.clone();

        let mut planned: Vec<(usize, ClauseType)> = Vec::new();
        let mut tasks = JoinSet::new();

        for chunk in chunks {
            for &clause_type in &self.clause_types {
                planned.push((chunk.index, clause_type));
                tasks.spawn(self.attempt_task(chunk, clause_type));
            }
        }

        let deadline = Instant::now() + self.deadline;
        loop {
            tokio::select! {
                joined = tasks.join_next() => {
                    match joined {
                        Some(Ok(attempt)) => {
                            attempts.insert((attempt.chunk_index, attempt.clause_type), attempt);
                        }
                        Some(Err(join_error)) => {
                            // Panicked or aborted task; its key is filled in
                            // as failed below
                            warn!(%document, %join_error, "extraction task did not complete");
                        }
                        None => break,
                    }
                }
                _ = sleep_until(deadline) => {
                    warn!(%document, "document deadline expired, cancelling outstanding attempts");
                    tasks.abort_all();
                    while let Some(joined) = tasks.join_next().await {
                        if let Ok(attempt) = joined {
                            attempts.insert((attempt.chunk_index, attempt.clause_type), attempt);
                        }
                    }
                    break;
                }
            }
        }

        for (chunk_index, clause_type) in planned {
            attempts
                .entry((chunk_index, clause_type))
                .or_insert_with(|| ClauseExtractionAttempt {
                    document: document.clone(),
                    chunk_index,
                    clause_type,
                    attempts: 0,
                    outcome: AttemptOutcome::Failed {
                        reason: CallError::Cancelled.to_string(),
                    },
                });
        }

        attempts
    }

    /// Build the future for one attempt. Each provider invocation holds a
    /// limiter permit only while the call itself is in flight, so backoff
    /// sleeps do not occupy a slot.
    fn attempt_task(
        &self,
        chunk: &Chunk,
        clause_type: ClauseType,
    ) -> impl std::future::Future<Output = ClauseExtractionAttempt> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let caller = self.caller.clone();
        let limiter = Arc::clone(&self.limiter);
        let prompt = self.prompts.extraction_prompt(clause_type, &chunk.text);
        let document = chunk.document.clone();
        let chunk_index = chunk.index;
        let (min_span, max_span) = (self.min_span_chars, self.max_span_chars);
        let (temperature, max_tokens) = (self.temperature, self.max_tokens);

        async move {
            let invocations = Arc::new(AtomicU32::new(0));
            let result = caller
                .call(|| {
                    let provider = Arc::clone(&provider);
                    let limiter = Arc::clone(&limiter);
                    let prompt = prompt.clone();
                    let invocations = Arc::clone(&invocations);
                    async move {
                        let _permit = limiter
                            .acquire_owned()
                            .await
                            .map_err(|_| CallError::Cancelled)?;
                        invocations.fetch_add(1, Ordering::SeqCst);
                        provider.generate(&prompt, temperature, max_tokens).await
                    }
                })
                .await;

            let outcome = match result {
                Ok(raw) => match parse_span_response(&raw, min_span, max_span) {
                    Ok(SpanResponse::Spans(spans)) => AttemptOutcome::Found { spans },
                    Ok(SpanResponse::NotPresent) => AttemptOutcome::NotPresent,
                    Err(validation) => AttemptOutcome::Failed {
                        reason: validation.to_string(),
                    },
                },
                Err(call_error) => AttemptOutcome::Failed {
                    reason: call_error.to_string(),
                },
            };

            debug!(
                %document,
                chunk_index,
                %clause_type,
                invocations = invocations.load(Ordering::SeqCst),
                outcome = ?outcome_kind(&outcome),
                "extraction attempt terminal"
            );

            ClauseExtractionAttempt {
                document,
                chunk_index,
                clause_type,
                attempts: invocations.load(Ordering::SeqCst),
                outcome,
            }
        }
    }
}

fn outcome_kind(outcome: &AttemptOutcome) -> &'static str {
    match outcome {
        AttemptOutcome::Found { .. } => "found",
        AttemptOutcome::NotPresent => "not_present",
        AttemptOutcome::Failed { .. } => "failed",
    }
}
