//! Generation response parsing
//!
//! Turns a raw extraction response into either a set of clause spans or an
//! explicit not-present outcome. Parsing is lenient about the chatter models
//! wrap answers in (label prefixes, "no such clause" phrasings) but strict
//! about shape: responses that survive cleanup must be non-empty and each
//! span must fit the configured length bounds.

use crate::error::ValidationError;
use crate::prompt::NOT_FOUND_TOKEN;

/// Label prefixes models prepend despite instructions; stripped repeatedly
/// until none match
const ANSWER_PREFIXES: [&str; 8] = [
    "Extracted Clause(s):",
    "Extracted Termination Clause:",
    "Extracted Confidentiality Clause:",
    "Extracted Liability Clause:",
    "Extracted Clause:",
    "The clause is:",
    "Answer:",
    "Clause:",
];

/// Phrasings that mean the clause is absent even without the exact token
const NO_CLAUSE_INDICATORS: [&str; 7] = [
    "no termination clause",
    "no confidentiality clause",
    "no liability clause",
    "clause is not present",
    "does not contain",
    "no such clause",
    "clause not found",
];

/// Delimiter separating disjoint spans inside a single response
const RESPONSE_DELIMITER: &str = "|||";

/// A parsed extraction response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanResponse {
    /// One or more clause spans, in response order
    Spans(Vec<String>),

    /// The model affirmed the clause is absent from this chunk
    NotPresent,
}

/// Parse a raw extraction response.
///
/// Spans shorter than `min_len` are treated as noise rather than clauses; a
/// whole response below `min_len` after cleanup reads as not-present. A span
/// longer than `max_len` fails shape validation.
pub fn parse_span_response(
    raw: &str,
    min_len: usize,
    max_len: usize,
) -> Result<SpanResponse, ValidationError> {
    let mut cleaned = raw.trim();
    loop {
        let mut stripped = false;
        for prefix in ANSWER_PREFIXES {
            if let Some(rest) = cleaned.strip_prefix(prefix) {
                cleaned = rest.trim_start();
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }

    if cleaned.is_empty() {
        return Err(ValidationError::Empty);
    }

    let upper = cleaned.to_uppercase();
    if upper.contains(NOT_FOUND_TOKEN) || upper.contains("NOT FOUND") {
        return Ok(SpanResponse::NotPresent);
    }

    let lower = cleaned.to_lowercase();
    if NO_CLAUSE_INDICATORS.iter().any(|i| lower.contains(i)) {
        return Ok(SpanResponse::NotPresent);
    }

    if cleaned.len() < min_len {
        return Ok(SpanResponse::NotPresent);
    }

    let mut spans = Vec::new();
    for part in cleaned.split(RESPONSE_DELIMITER) {
        let span = part.trim();
        if span.is_empty() || span.len() < min_len {
            continue;
        }
        if span.len() > max_len {
            return Err(ValidationError::SpanTooLong {
                len: span.len(),
                max: max_len,
            });
        }
        spans.push(span.to_string());
    }

    if spans.is_empty() {
        Ok(SpanResponse::NotPresent)
    } else {
        Ok(SpanResponse::Spans(spans))
    }
}
