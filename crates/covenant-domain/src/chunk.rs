//! Bounded, overlapping slices of normalized document text

use crate::document::DocumentId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous slice of a document's normalized text.
///
/// Chunks form an ordered sequence. Consecutive chunks overlap by a bounded
/// number of bytes so that a clause straddling a cut point appears whole in
/// at least one chunk. `range` is the byte offset range in the normalized
/// text, and `text` is exactly that slice - concatenating chunks with their
/// overlap prefixes removed reconstructs the normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Owning document
    pub document: DocumentId,

    /// Position in the chunk sequence, starting at 0
    pub index: usize,

    /// Byte offset range in the normalized text
    pub range: Range<usize>,

    /// The text slice itself
    pub text: String,
}

impl Chunk {
    /// Length of the chunk in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the chunk is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of bytes shared with the previous chunk in the sequence
    pub fn overlap_with(&self, previous: &Chunk) -> usize {
        previous.range.end.saturating_sub(self.range.start)
    }
}
