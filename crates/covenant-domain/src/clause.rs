//! Clause categories and per-document extraction results

use crate::document::DocumentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A legal clause category targeted for extraction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    /// Conditions and effects of ending the agreement
    Termination,
    /// Non-disclosure and protection of confidential information
    Confidentiality,
    /// Limitation of liability and indemnification provisions
    Liability,
}

impl ClauseType {
    /// All clause types, in canonical order
    pub fn all() -> [ClauseType; 3] {
        [
            ClauseType::Termination,
            ClauseType::Confidentiality,
            ClauseType::Liability,
        ]
    }

    /// Stable lowercase name, used in prompts and output columns
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseType::Termination => "termination",
            ClauseType::Confidentiality => "confidentiality",
            ClauseType::Liability => "liability",
        }
    }
}

impl fmt::Display for ClauseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extracted clause span, or its explicit absence.
///
/// Absence is a distinct tagged value. An empty string never stands in for
/// "not found", and a found span is guaranteed non-empty by the response
/// validator upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ClauseSpan {
    /// Verbatim clause text from the contract (possibly several disjoint
    /// occurrences joined by the configured delimiter)
    Found(String),
    /// The clause is absent from the document
    NotFound,
}

impl ClauseSpan {
    /// Whether a span was found
    pub fn is_found(&self) -> bool {
        matches!(self, ClauseSpan::Found(_))
    }

    /// The span text, if found
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ClauseSpan::Found(text) => Some(text),
            ClauseSpan::NotFound => None,
        }
    }
}

/// The extraction result for one clause type within one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseRecord {
    /// Which clause category this record covers
    pub clause_type: ClauseType,

    /// The extracted span, or explicit absence
    pub span: ClauseSpan,

    /// Indices of the chunks that contributed the span (empty when not found)
    pub source_chunks: Vec<usize>,
}

impl ClauseRecord {
    /// A record marking the clause as absent
    pub fn not_found(clause_type: ClauseType) -> Self {
        Self {
            clause_type,
            span: ClauseSpan::NotFound,
            source_chunks: Vec::new(),
        }
    }
}

/// Size statistics captured alongside a contract record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Length of the normalized text in bytes
    pub text_len: usize,

    /// Whitespace-separated word count of the normalized text
    pub word_count: usize,

    /// Word count of the generated summary (0 when no summary was produced)
    pub summary_word_count: usize,
}

/// The per-document output of the pipeline: one summary plus one clause
/// record per configured clause type. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Source document identity
    pub document: DocumentId,

    /// Generated summary, or `None` when summary generation failed
    /// permanently (clause extraction results are still valid)
    pub summary: Option<String>,

    /// One record per configured clause type
    pub clauses: BTreeMap<ClauseType, ClauseRecord>,

    /// Size statistics for reporting
    pub stats: DocumentStats,
}

impl ContractRecord {
    /// The record for a clause type, if that type was configured for the run
    pub fn clause(&self, clause_type: ClauseType) -> Option<&ClauseRecord> {
        self.clauses.get(&clause_type)
    }

    /// Number of clause types with a found span
    pub fn found_count(&self) -> usize {
        self.clauses.values().filter(|c| c.span.is_found()).count()
    }
}

/// Count whitespace-separated words in a text
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_type_names() {
        assert_eq!(ClauseType::Termination.as_str(), "termination");
        assert_eq!(ClauseType::Confidentiality.to_string(), "confidentiality");
        assert_eq!(ClauseType::all().len(), 3);
    }

    #[test]
    fn test_span_absence_is_not_empty_string() {
        let span = ClauseSpan::NotFound;
        assert!(!span.is_found());
        assert_eq!(span.as_text(), None);

        let found = ClauseSpan::Found("Either party may terminate.".to_string());
        assert!(found.is_found());
        assert_ne!(found, ClauseSpan::Found(String::new()));
    }

    #[test]
    fn test_found_count() {
        let mut clauses = BTreeMap::new();
        clauses.insert(
            ClauseType::Termination,
            ClauseRecord {
                clause_type: ClauseType::Termination,
                span: ClauseSpan::Found("text".to_string()),
                source_chunks: vec![0],
            },
        );
        clauses.insert(
            ClauseType::Liability,
            ClauseRecord::not_found(ClauseType::Liability),
        );

        let record = ContractRecord {
            document: DocumentId::new("doc"),
            summary: None,
            clauses,
            stats: DocumentStats::default(),
        };
        assert_eq!(record.found_count(), 1);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("one  two\nthree"), 3);
    }

    #[test]
    fn test_clause_type_serde_as_string() {
        let json = serde_json::to_string(&ClauseType::Termination).unwrap();
        assert_eq!(json, "\"termination\"");
    }
}
