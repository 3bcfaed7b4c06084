//! Text normalization
//!
//! Deterministic, total cleanup of raw extracted text: line-ending
//! canonicalization, page-furniture stripping, non-printable removal and
//! whitespace collapsing. `normalize` is idempotent - running it on its own
//! output changes nothing - which lets downstream stages treat normalized
//! text as a fixed point.

use regex::Regex;
use std::collections::HashMap;

/// Default fraction of pages a repeated line must appear on to count as
/// furniture
pub const DEFAULT_FURNITURE_FRACTION: f64 = 0.5;

/// Cleans and canonicalizes raw extracted text
pub struct TextNormalizer {
    furniture_fraction: f64,
    page_line_re: Regex,
    page_inline_re: Regex,
    hspace_re: Regex,
    trailing_re: Regex,
    blank_re: Regex,
}

impl TextNormalizer {
    /// Create a normalizer. `furniture_fraction` is the fraction of pages a
    /// repeated line must appear on before it is stripped.
    pub fn new(furniture_fraction: f64) -> Self {
        Self {
            furniture_fraction,
            page_line_re: Regex::new(r"(?mi)^[ \t]*page[ \t]+\d+([ \t]+of[ \t]+\d+)?[ \t]*$")
                .expect("literal regex"),
            page_inline_re: Regex::new(r"(?i)page[ \t]+\d+[ \t]+of[ \t]+\d+")
                .expect("literal regex"),
            hspace_re: Regex::new(r"[ \t]+").expect("literal regex"),
            trailing_re: Regex::new(r"(?m)[ \t]+$").expect("literal regex"),
            blank_re: Regex::new(r"\n{3,}").expect("literal regex"),
        }
    }

    /// Normalize raw text. Deterministic and idempotent.
    pub fn normalize(&self, text: &str) -> String {
        // Canonical line endings first; everything below assumes '\n'
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        // Strip lines repeated across form-feed-delimited pages (headers,
        // footers) before the form feeds themselves are removed
        let text = self.strip_page_furniture(&text);

        // Page-number furniture that survives regardless of page markers
        let text = self.page_line_re.replace_all(&text, "");
        let text = self.page_inline_re.replace_all(&text, "");

        // Drop non-printables, keeping only structural whitespace
        let text: String = text
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();

        // Whitespace canonicalization
        let text = self.hspace_re.replace_all(&text, " ");
        let text = self.trailing_re.replace_all(&text, "");
        let text = self.blank_re.replace_all(&text, "\n\n");

        text.trim().to_string()
    }

    /// Remove lines that recur across enough pages to be headers/footers.
    /// Pages are inferred from form-feed markers; without at least two
    /// pages there is nothing to compare and the text passes through.
    fn strip_page_furniture(&self, text: &str) -> String {
        if !text.contains('\u{c}') {
            return text.to_string();
        }

        let pages: Vec<&str> = text.split('\u{c}').collect();

        let mut line_pages: HashMap<&str, usize> = HashMap::new();
        for page in &pages {
            let mut seen: Vec<&str> = Vec::new();
            for line in page.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() || seen.contains(&trimmed) {
                    continue;
                }
                seen.push(trimmed);
                *line_pages.entry(trimmed).or_insert(0) += 1;
            }
        }

        let threshold =
            ((pages.len() as f64 * self.furniture_fraction).ceil() as usize).max(2);

        let mut out = String::with_capacity(text.len());
        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for line in page.lines() {
                let trimmed = line.trim();
                if !trimmed.is_empty()
                    && line_pages.get(trimmed).copied().unwrap_or(0) >= threshold
                {
                    continue;
                }
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_FURNITURE_FRACTION)
    }
}
