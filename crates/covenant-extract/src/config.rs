//! Configuration for the contract pipeline

use covenant_domain::ClauseType;
use covenant_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry knobs, serde-friendly mirror of [`RetryPolicy`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum invocations per external call
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Cap on any single delay, in milliseconds
    pub max_delay_ms: u64,

    /// Randomize delays to avoid synchronized retries
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

impl RetrySettings {
    /// Convert into the runtime policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Clause types to extract for every document
    pub clause_types: Vec<ClauseType>,

    /// Maximum chunk size (bytes, snapped to UTF-8 boundaries)
    pub max_chunk_size: usize,

    /// Bytes shared between consecutive chunks
    pub chunk_overlap: usize,

    /// How far before the cut point to look for a sentence terminator
    pub boundary_window: usize,

    /// Retry behavior for generation and embedding calls
    pub retry: RetrySettings,

    /// Minimum acceptable summary length in words
    pub summary_min_words: usize,

    /// Maximum acceptable summary length in words
    pub summary_max_words: usize,

    /// Corrective re-prompt budget when the summary is out of range
    pub summary_attempts: u32,

    /// Summary input cap: only the first this-many bytes of normalized text
    /// are sent to the generation capability
    pub summary_input_cap: usize,

    /// Minimum quality score an extraction candidate must reach
    pub min_quality_score: f64,

    /// Spans shorter than this are treated as noise, not clauses
    pub min_span_chars: usize,

    /// Spans longer than this fail shape validation
    pub max_span_chars: usize,

    /// Delimiter joining disjoint occurrences of the same clause type
    pub span_delimiter: String,

    /// Marker used for absent clauses in user-facing output
    pub not_found_marker: String,

    /// Documents processed in parallel
    pub document_concurrency: usize,

    /// Global cap on in-flight generation/embedding calls
    pub max_inflight_calls: usize,

    /// Per-document deadline in seconds; outstanding attempts are cancelled
    /// when it expires
    pub document_deadline_secs: u64,

    /// Sampling temperature for clause extraction
    pub temperature: f32,

    /// Sampling temperature for summary generation
    pub summary_temperature: f32,

    /// Token budget for clause extraction responses
    pub max_tokens: u32,

    /// Token budget for summary responses
    pub summary_max_tokens: u32,

    /// A line repeated across at least this fraction of pages is treated as
    /// page furniture and stripped
    pub furniture_page_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clause_types: ClauseType::all().to_vec(),
            max_chunk_size: 8_000,
            chunk_overlap: 500,
            boundary_window: 200,
            retry: RetrySettings::default(),
            summary_min_words: 100,
            summary_max_words: 150,
            summary_attempts: 3,
            summary_input_cap: 18_000,
            min_quality_score: 0.2,
            min_span_chars: 20,
            max_span_chars: 8_000,
            span_delimiter: " ||| ".to_string(),
            not_found_marker: "Not found".to_string(),
            document_concurrency: 4,
            max_inflight_calls: 4,
            document_deadline_secs: 600,
            temperature: 0.0,
            summary_temperature: 0.3,
            max_tokens: 8_192,
            summary_max_tokens: 500,
            furniture_page_fraction: 0.5,
        }
    }
}

impl PipelineConfig {
    /// Per-document deadline as a Duration
    pub fn document_deadline(&self) -> Duration {
        Duration::from_secs(self.document_deadline_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.clause_types.is_empty() {
            return Err("clause_types must not be empty".to_string());
        }
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.max_chunk_size {
            return Err("chunk_overlap must be smaller than max_chunk_size".to_string());
        }
        if self.boundary_window >= self.max_chunk_size - self.chunk_overlap {
            return Err(
                "boundary_window must be smaller than max_chunk_size - chunk_overlap".to_string(),
            );
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if self.summary_min_words > self.summary_max_words {
            return Err("summary_min_words must not exceed summary_max_words".to_string());
        }
        if self.summary_attempts == 0 {
            return Err("summary_attempts must be at least 1".to_string());
        }
        if self.min_span_chars > self.max_span_chars {
            return Err("min_span_chars must not exceed max_span_chars".to_string());
        }
        if self.document_concurrency == 0 {
            return Err("document_concurrency must be at least 1".to_string());
        }
        if self.max_inflight_calls == 0 {
            return Err("max_inflight_calls must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.furniture_page_fraction) {
            return Err("furniture_page_fraction must be within [0, 1]".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {e}"))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {e}"))
    }
}
