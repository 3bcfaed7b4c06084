//! Document identity and raw input

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a contract document.
///
/// Derived from the source file stem by convention, but any non-empty string
/// is accepted. Used to key every downstream artifact (chunks, attempts,
/// records, index entries) back to its source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a document id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            Self("unknown_contract".to_string())
        } else {
            Self(id)
        }
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as supplied by the external document source: identity plus the
/// raw byte rendering, before any extraction method has run.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Document identity
    pub id: DocumentId,

    /// Raw bytes (PDF, plain text, or any format a configured extraction
    /// method understands)
    pub bytes: Vec<u8>,
}

impl RawDocument {
    /// Create a raw document
    pub fn new(id: impl Into<DocumentId>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_display() {
        let id = DocumentId::new("contract_001");
        assert_eq!(id.to_string(), "contract_001");
        assert_eq!(id.as_str(), "contract_001");
    }

    #[test]
    fn test_empty_id_falls_back() {
        let id = DocumentId::new("");
        assert_eq!(id.as_str(), "unknown_contract");
    }
}
