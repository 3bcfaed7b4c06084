//! Result aggregation
//!
//! Folds the per-(chunk, clause type) attempt map into one
//! [`ContractRecord`]: spans for the same clause type are deduplicated by
//! containment and joined in chunk order, and a bounded-length summary is
//! generated with corrective re-prompting when the first draft misses the
//! word range.
//!
//! Failed attempts contribute nothing here; they were already recorded by
//! the orchestrator. A clause type with no surviving span aggregates to an
//! explicit not-found record, never to an empty string.

use crate::config::PipelineConfig;
use crate::orchestrator::{AttemptMap, AttemptOutcome};
use crate::prompt::PromptBuilder;
use covenant_domain::{
    count_words, CallError, ClauseRecord, ClauseSpan, ClauseType, ContractRecord, DocumentId,
    DocumentStats, GenerationProvider,
};
use covenant_llm::RetryingCaller;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// A span kept during deduplication, with the chunks that produced it
struct KeptSpan {
    text: String,
    lower: String,
    chunks: BTreeSet<usize>,
}

/// Folds attempt maps into contract records
pub struct ResultAggregator {
    provider: Arc<dyn GenerationProvider>,
    caller: RetryingCaller,
    prompts: PromptBuilder,
    clause_types: Vec<ClauseType>,
    span_delimiter: String,
    summary_min_words: usize,
    summary_max_words: usize,
    summary_attempts: u32,
    summary_input_cap: usize,
    summary_temperature: f32,
    summary_max_tokens: u32,
}

impl ResultAggregator {
    /// Create an aggregator sharing the pipeline's generation provider
    pub fn new(provider: Arc<dyn GenerationProvider>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            caller: RetryingCaller::new(config.retry.policy()),
            prompts: PromptBuilder::new(),
            clause_types: config.clause_types.clone(),
            span_delimiter: config.span_delimiter.clone(),
            summary_min_words: config.summary_min_words,
            summary_max_words: config.summary_max_words,
            summary_attempts: config.summary_attempts,
            summary_input_cap: config.summary_input_cap,
            summary_temperature: config.summary_temperature,
            summary_max_tokens: config.summary_max_tokens,
        }
    }

    /// Build the final record for one document from its normalized text and
    /// terminal attempt map.
    pub async fn aggregate(
        &self,
        document: &DocumentId,
        text: &str,
        attempts: &AttemptMap,
    ) -> ContractRecord {
        let clauses = self.merge_clauses(attempts);

        let summary = if text.trim().is_empty() {
            None
        } else {
            match self.summarize(text).await {
                Ok(summary) => Some(summary),
                Err(error) => {
                    warn!(%document, %error, "summary generation failed, record keeps clause results");
                    None
                }
            }
        };

        let stats = DocumentStats {
            text_len: text.len(),
            word_count: count_words(text),
            summary_word_count: summary.as_deref().map(count_words).unwrap_or(0),
        };

        ContractRecord {
            document: document.clone(),
            summary,
            clauses,
            stats,
        }
    }

    /// Merge found spans per clause type: chunk order, containment dedup,
    /// delimiter join. Every configured clause type gets a record.
    pub fn merge_clauses(&self, attempts: &AttemptMap) -> BTreeMap<ClauseType, ClauseRecord> {
        let mut records = BTreeMap::new();

        for &clause_type in &self.clause_types {
            // AttemptMap keys sort by chunk index first, so iteration
            // preserves chunk order within a clause type
            let mut kept: Vec<KeptSpan> = Vec::new();

            for ((chunk_index, _), attempt) in attempts
                .iter()
                .filter(|((_, ct), _)| *ct == clause_type)
            {
                if let AttemptOutcome::Found { spans } = &attempt.outcome {
                    for span in spans {
                        absorb_span(&mut kept, span, *chunk_index);
                    }
                }
            }

            let record = if kept.is_empty() {
                ClauseRecord::not_found(clause_type)
            } else {
                let mut source_chunks: BTreeSet<usize> = BTreeSet::new();
                for span in &kept {
                    source_chunks.extend(span.chunks.iter().copied());
                }
                let joined = kept
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(&self.span_delimiter);
                ClauseRecord {
                    clause_type,
                    span: ClauseSpan::Found(joined),
                    source_chunks: source_chunks.into_iter().collect(),
                }
            };
            records.insert(clause_type, record);
        }

        records
    }

    /// Generate a summary within the configured word bounds.
    ///
    /// Out-of-range drafts trigger corrective re-prompts, up to the attempt
    /// budget; if no draft lands in range, the one closest to the bounds is
    /// returned rather than nothing.
    pub async fn summarize(&self, text: &str) -> Result<String, CallError> {
        let capped = &text[..floor_char_boundary(text, self.summary_input_cap)];
        let mut prompt = self
            .prompts
            .summary_prompt(capped, self.summary_min_words, self.summary_max_words);

        let mut best: Option<(String, usize)> = None;

        for attempt in 1..=self.summary_attempts {
            let prompt_ref = &prompt;
            let draft = self
                .caller
                .call(|| async move {
                    self.provider
                        .generate(prompt_ref, self.summary_temperature, self.summary_max_tokens)
                        .await
                })
                .await?;
            let draft = draft.trim().to_string();
            let words = count_words(&draft);

            if (self.summary_min_words..=self.summary_max_words).contains(&words) {
                return Ok(draft);
            }

            debug!(
                attempt,
                words,
                min = self.summary_min_words,
                max = self.summary_max_words,
                "summary outside word bounds"
            );

            let distance = self.bound_distance(words);
            let better = match &best {
                Some((_, best_distance)) => distance < *best_distance,
                None => true,
            };
            prompt = self.prompts.summary_retry_prompt(
                &draft,
                words,
                self.summary_min_words,
                self.summary_max_words,
            );
            if better {
                best = Some((draft, distance));
            }
        }

        match best {
            Some((draft, _)) => Ok(draft),
            // Unreachable with a validated config (summary_attempts >= 1)
            None => Err(CallError::InvalidResponse(
                "no summary draft produced".to_string(),
            )),
        }
    }

    fn bound_distance(&self, words: usize) -> usize {
        if words < self.summary_min_words {
            self.summary_min_words - words
        } else {
            words.saturating_sub(self.summary_max_words)
        }
    }
}

/// Fold a new span into the kept set. A span contained (case-insensitively)
/// in an already-kept span only contributes its chunk; a span containing
/// kept spans replaces them, inheriting their chunks.
fn absorb_span(kept: &mut Vec<KeptSpan>, span: &str, chunk_index: usize) {
    let lower = span.to_lowercase();

    for existing in kept.iter_mut() {
        if existing.lower.contains(&lower) {
            existing.chunks.insert(chunk_index);
            return;
        }
    }

    let mut chunks = BTreeSet::new();
    chunks.insert(chunk_index);
    kept.retain_mut(|existing| {
        if lower.contains(&existing.lower) {
            chunks.extend(existing.chunks.iter().copied());
            false
        } else {
            true
        }
    });

    kept.push(KeptSpan {
        text: span.to_string(),
        lower,
        chunks,
    });
}

fn floor_char_boundary(text: &str, at: usize) -> usize {
    let mut i = at.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}
