//! Extraction method selection
//!
//! Every configured [`ExtractionMethod`] runs against the raw bytes; each
//! successful candidate is scored for apparent text fidelity and the best
//! one wins. A single method failing only excludes that method. The whole
//! selection fails only when no method succeeds or the best candidate
//! scores below the configured minimum.

use crate::error::ExtractionFailure;
use covenant_domain::{DocumentId, ExtractionMethod, MethodError};
use tracing::{debug, warn};

// Quality score weights. The saturating character/word terms reward longer
// renderings without letting sheer length drown out the fidelity ratios.
const CHAR_WEIGHT: f64 = 0.3;
const WORD_WEIGHT: f64 = 0.2;
const ALNUM_WEIGHT: f64 = 0.5;
const GARBAGE_WEIGHT: f64 = 1.0;
const CHAR_SCALE: f64 = 4_000.0;
const WORD_SCALE: f64 = 800.0;

/// A scored output of one extraction method. Ephemeral: discarded once the
/// winner is chosen.
#[derive(Debug, Clone)]
pub struct ExtractionCandidate {
    /// Method that produced the text
    pub method: String,

    /// The extracted text
    pub text: String,

    /// Quality score
    pub score: f64,
}

/// The winning text rendering for a document
#[derive(Debug, Clone)]
pub struct SelectedText {
    /// The raw extracted text (not yet normalized)
    pub text: String,

    /// Winning method name
    pub method: String,

    /// Winning quality score
    pub score: f64,
}

/// Picks the best raw-text rendering among the configured methods
pub struct ExtractionSelector {
    methods: Vec<Box<dyn ExtractionMethod>>,
    min_score: f64,
}

impl ExtractionSelector {
    /// Create a selector. Method order is the fixed priority order used to
    /// break score ties.
    pub fn new(methods: Vec<Box<dyn ExtractionMethod>>, min_score: f64) -> Self {
        Self { methods, min_score }
    }

    /// The default method set: PDF rendering first, then strict UTF-8,
    /// then lossy decoding as a last resort.
    pub fn default_methods() -> Vec<Box<dyn ExtractionMethod>> {
        vec![
            Box::new(PdfTextMethod),
            Box::new(Utf8TextMethod),
            Box::new(LossyTextMethod),
        ]
    }

    /// Run every method and return the best-scoring candidate.
    pub fn select(
        &self,
        document: &DocumentId,
        raw: &[u8],
    ) -> Result<SelectedText, ExtractionFailure> {
        let mut best: Option<ExtractionCandidate> = None;
        let mut failures: Vec<String> = Vec::new();

        for method in &self.methods {
            match method.try_extract(raw) {
                Ok(text) => {
                    let score = quality_score(&text);
                    debug!(%document, method = method.name(), score, chars = text.len(), "extraction candidate");
                    let candidate = ExtractionCandidate {
                        method: method.name().to_string(),
                        text,
                        score,
                    };
                    // Strictly-greater keeps the earlier (higher priority)
                    // method on ties.
                    let replace = match &best {
                        Some(current) => candidate.score > current.score,
                        None => true,
                    };
                    if replace {
                        best = Some(candidate);
                    }
                }
                Err(MethodError(reason)) => {
                    debug!(%document, method = method.name(), %reason, "extraction method failed");
                    failures.push(format!("{}: {}", method.name(), reason));
                }
            }
        }

        match best {
            Some(candidate) if candidate.score >= self.min_score => Ok(SelectedText {
                text: candidate.text,
                method: candidate.method,
                score: candidate.score,
            }),
            Some(candidate) => {
                warn!(%document, score = candidate.score, min = self.min_score, "best candidate below quality threshold");
                Err(ExtractionFailure::new(
                    document.clone(),
                    format!(
                        "best candidate ({}) scored {:.3}, below minimum {:.3}",
                        candidate.method, candidate.score, self.min_score
                    ),
                ))
            }
            None => Err(ExtractionFailure::new(
                document.clone(),
                format!("all extraction methods failed: [{}]", failures.join("; ")),
            )),
        }
    }
}

/// Heuristic text-fidelity score.
///
/// Weighted combination of saturating character and word counts, the ratio
/// of alphanumeric characters among non-whitespace, and a penalty for
/// control characters. Deterministic for identical input.
pub fn quality_score(text: &str) -> f64 {
    let mut chars = 0usize;
    let mut non_ws = 0usize;
    let mut alnum = 0usize;
    let mut garbage = 0usize;

    for c in text.chars() {
        chars += 1;
        if c.is_control() && c != '\n' && c != '\t' && c != '\r' {
            garbage += 1;
        }
        if !c.is_whitespace() {
            non_ws += 1;
            if c.is_alphanumeric() {
                alnum += 1;
            }
        }
    }

    if chars == 0 || text.trim().is_empty() {
        return 0.0;
    }

    let words = text.split_whitespace().count() as f64;
    let chars_f = chars as f64;

    let char_term = chars_f / (chars_f + CHAR_SCALE);
    let word_term = words / (words + WORD_SCALE);
    let alnum_ratio = if non_ws > 0 {
        alnum as f64 / non_ws as f64
    } else {
        0.0
    };
    let garbage_ratio = garbage as f64 / chars_f;

    CHAR_WEIGHT * char_term + WORD_WEIGHT * word_term + ALNUM_WEIGHT * alnum_ratio
        - GARBAGE_WEIGHT * garbage_ratio
}

/// Renders PDF bytes via the `pdf-extract` crate
pub struct PdfTextMethod;

impl ExtractionMethod for PdfTextMethod {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn try_extract(&self, raw: &[u8]) -> Result<String, MethodError> {
        if !raw.starts_with(b"%PDF") {
            return Err(MethodError::new("not a PDF header"));
        }
        pdf_extract::extract_text_from_mem(raw).map_err(|e| MethodError::new(e.to_string()))
    }
}

/// Strict UTF-8 decoding; fails on any invalid sequence
pub struct Utf8TextMethod;

impl ExtractionMethod for Utf8TextMethod {
    fn name(&self) -> &str {
        "utf8"
    }

    fn try_extract(&self, raw: &[u8]) -> Result<String, MethodError> {
        std::str::from_utf8(raw)
            .map(|s| s.to_string())
            .map_err(|e| MethodError::new(format!("invalid UTF-8: {e}")))
    }
}

/// Lossy UTF-8 decoding; always succeeds on non-empty input but invalid
/// sequences become replacement characters, which the quality score counts
/// against it
pub struct LossyTextMethod;

impl ExtractionMethod for LossyTextMethod {
    fn name(&self) -> &str {
        "utf8-lossy"
    }

    fn try_extract(&self, raw: &[u8]) -> Result<String, MethodError> {
        if raw.is_empty() {
            return Err(MethodError::new("empty input"));
        }
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMethod {
        name: &'static str,
        output: Result<String, String>,
    }

    impl ExtractionMethod for FixedMethod {
        fn name(&self) -> &str {
            self.name
        }

        fn try_extract(&self, _raw: &[u8]) -> Result<String, MethodError> {
            self.output
                .clone()
                .map_err(MethodError::new)
        }
    }

    fn ok(name: &'static str, text: &str) -> Box<dyn ExtractionMethod> {
        Box::new(FixedMethod {
            name,
            output: Ok(text.to_string()),
        })
    }

    fn failing(name: &'static str) -> Box<dyn ExtractionMethod> {
        Box::new(FixedMethod {
            name,
            output: Err("boom".to_string()),
        })
    }

    #[test]
    fn test_selects_maximum_score() {
        let long = "This Agreement may be terminated by either party. ".repeat(40);
        let selector = ExtractionSelector::new(
            vec![ok("short", "brief text."), ok("long", &long)],
            0.0,
        );
        let selected = selector.select(&DocumentId::new("doc"), b"raw").unwrap();
        assert_eq!(selected.method, "long");
    }

    #[test]
    fn test_tie_broken_by_priority_order() {
        let text = "Identical candidate text for both methods, long enough to score.";
        let selector = ExtractionSelector::new(vec![ok("first", text), ok("second", text)], 0.0);
        let selected = selector.select(&DocumentId::new("doc"), b"raw").unwrap();
        assert_eq!(selected.method, "first");
    }

    #[test]
    fn test_method_failure_is_not_fatal() {
        let selector = ExtractionSelector::new(
            vec![failing("broken"), ok("works", "Some perfectly usable contract text here.")],
            0.0,
        );
        let selected = selector.select(&DocumentId::new("doc"), b"raw").unwrap();
        assert_eq!(selected.method, "works");
    }

    #[test]
    fn test_all_methods_failing_is_extraction_failure() {
        let selector = ExtractionSelector::new(vec![failing("a"), failing("b")], 0.0);
        let err = selector.select(&DocumentId::new("doc"), b"raw").unwrap_err();
        assert!(err.reason.contains("all extraction methods failed"));
        assert!(err.reason.contains("a: boom"));
    }

    #[test]
    fn test_below_threshold_fails() {
        // Mostly control characters: high garbage ratio, low score
        let noisy: String = "\u{1}\u{2}\u{3}ab ".repeat(10);
        let selector = ExtractionSelector::new(vec![ok("noisy", &noisy)], 0.3);
        assert!(selector.select(&DocumentId::new("doc"), b"raw").is_err());
    }

    #[test]
    fn test_quality_score_properties() {
        assert_eq!(quality_score(""), 0.0);
        assert_eq!(quality_score("   \n\t "), 0.0);

        let clean = "The parties agree to the following terms and conditions.";
        let garbled = "\u{1}\u{2}\u{3}\u{4}he p\u{5}rties agr\u{6}e";
        assert!(quality_score(clean) > quality_score(garbled));

        let long = clean.repeat(100);
        assert!(quality_score(&long) > quality_score(clean));
    }

    #[test]
    fn test_utf8_methods() {
        let strict = Utf8TextMethod;
        assert!(strict.try_extract(b"plain text").is_ok());
        assert!(strict.try_extract(&[0xff, 0xfe, 0x00]).is_err());

        let lossy = LossyTextMethod;
        assert!(lossy.try_extract(&[0xff, b'h', b'i']).is_ok());
        assert!(lossy.try_extract(b"").is_err());
    }

    #[test]
    fn test_pdf_method_rejects_non_pdf() {
        let method = PdfTextMethod;
        assert!(method.try_extract(b"not a pdf at all").is_err());
    }
}
