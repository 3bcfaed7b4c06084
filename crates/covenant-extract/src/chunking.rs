//! Overlapping text chunking
//!
//! Splits normalized text into an ordered sequence of bounded, overlapping
//! [`Chunk`]s. Consecutive chunks share `overlap` bytes so a clause that
//! straddles a cut point appears whole in at least one chunk. Cut points
//! prefer a sentence terminator near the boundary; when none is close
//! enough, the cut is a hard one at the size limit.
//!
//! Splitting is purely a function of the text and the chunker parameters:
//! the same input always yields the same chunks.

use covenant_domain::{Chunk, DocumentId};

/// Bytes considered sentence terminators when snapping a cut point
const TERMINATORS: [u8; 3] = [b'.', b';', b'\n'];

/// Splits normalized text into overlapping chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
    boundary_window: usize,
}

impl Chunker {
    /// Create a chunker. Callers are expected to have validated that
    /// `overlap < max_size` and `boundary_window < max_size - overlap`.
    pub fn new(max_size: usize, overlap: usize, boundary_window: usize) -> Self {
        Self {
            max_size,
            overlap,
            boundary_window,
        }
    }

    /// Split `text` into chunks. Empty text yields no chunks; text at or
    /// under the size limit yields exactly one.
    pub fn split(&self, document: &DocumentId, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let len = text.len();
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let hard_end = floor_char_boundary(text, (start + self.max_size).min(len));
            let end = if hard_end >= len {
                len
            } else {
                self.snap_to_terminator(text, start, hard_end)
            };

            chunks.push(Chunk {
                document: document.clone(),
                index: chunks.len(),
                range: start..end,
                text: text[start..end].to_string(),
            });

            if end >= len {
                break;
            }

            let next = floor_char_boundary(text, end.saturating_sub(self.overlap));
            // Degenerate parameters could stall; force forward progress
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Prefer the last sentence terminator within the boundary window,
    /// keeping the cut far enough past `start` that the next chunk still
    /// advances. Falls back to the hard cut.
    fn snap_to_terminator(&self, text: &str, start: usize, hard_end: usize) -> usize {
        let lo = (start + self.overlap + 1).max(hard_end.saturating_sub(self.boundary_window));
        if lo >= hard_end {
            return hard_end;
        }
        let bytes = text.as_bytes();
        for i in (lo..hard_end).rev() {
            if TERMINATORS.contains(&bytes[i]) {
                return i + 1;
            }
        }
        hard_end
    }
}

/// Largest byte index `<= at` that falls on a char boundary
fn floor_char_boundary(text: &str, at: usize) -> usize {
    let mut i = at.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}
