//! Native PDF text extraction with a second layout engine for cid-garbled
//! documents.
//!
//! Some generators emit fonts whose glyphs the primary engine can only
//! report as `(cid:N)` placeholders. When those dominate the token stream,
//! or nothing was extracted at all, the lopdf extractor gets a chance and
//! the better of the two results wins.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::StageError;

use super::{patterns, Candidate, CandidateExtractor, Source};

static CID_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(cid:\d+\)").expect("static pattern"));

/// Share of whitespace-separated tokens that may be cid markers before the
/// primary result is considered garbled.
const CID_TOKEN_RATIO: f64 = 0.2;

/// The fallback text must beat the primary by this many characters to be
/// preferred when the primary is non-empty.
const FALLBACK_MARGIN: usize = 10;

/// True when a large share of the tokens are unmapped glyph ids.
pub fn has_cid_markers(text: &str) -> bool {
    let cid_count = CID_MARKER.find_iter(text).count();
    if cid_count == 0 {
        return false;
    }
    let total_tokens = text.split_whitespace().count();
    if total_tokens == 0 {
        return true;
    }
    cid_count as f64 / total_tokens as f64 > CID_TOKEN_RATIO
}

/// Full document text: pdf-extract first, lopdf when the primary output is
/// empty or cid-garbled.
pub fn document_text(pdf: &[u8], filename: &str) -> Result<String, StageError> {
    // Structural parse up front; the fallback engine reuses the document
    let document = lopdf::Document::load_mem(pdf).map_err(|e| StageError::InvalidPdf {
        filename: filename.to_string(),
        message: e.to_string(),
    })?;

    let primary = match pdf_extract::extract_text_from_mem(pdf) {
        Ok(text) => text,
        Err(e) => {
            warn!("{filename}: primary text engine failed: {e}");
            String::new()
        }
    };

    if !primary.trim().is_empty() && !has_cid_markers(&primary) {
        return Ok(primary);
    }

    debug!("{filename}: primary text unsatisfactory, trying layout fallback");
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    let fallback = match document.extract_text(&page_numbers) {
        Ok(text) => text,
        Err(e) if primary.trim().is_empty() => {
            return Err(StageError::TextExtraction {
                filename: filename.to_string(),
                message: e.to_string(),
            });
        }
        Err(e) => {
            warn!("{filename}: fallback text engine failed: {e}");
            return Ok(primary);
        }
    };

    if primary.trim().is_empty() || fallback.trim().len() > primary.trim().len() + FALLBACK_MARGIN {
        info!("{filename}: using fallback text engine output");
        return Ok(fallback);
    }
    Ok(primary)
}

#[derive(Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        TextExtractor
    }
}

impl CandidateExtractor for TextExtractor {
    fn source(&self) -> Source {
        Source::Text
    }

    fn extract(&self, pdf: &[u8], filename: &str) -> Result<Vec<Candidate>, StageError> {
        let text = document_text(pdf, filename)?;
        Ok(patterns::harvest(&text, Source::Text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_density_gate() {
        assert!(!has_cid_markers(""));
        assert!(!has_cid_markers("linha digitável 23790"));
        // 1 marker out of 10 tokens stays under the 20% gate
        let light = format!("(cid:12) {}", "palavra ".repeat(9));
        assert!(!has_cid_markers(&light));
        // half the tokens are markers
        let heavy = "(cid:1) (cid:2) (cid:3) texto restante legível";
        assert!(has_cid_markers(heavy));
        // markers with no other tokens at all
        assert!(has_cid_markers("(cid:1)(cid:2)"));
    }

    #[test]
    fn test_malformed_pdf_is_invalid_pdf() {
        let err = document_text(b"not a pdf at all", "bogus.pdf").unwrap_err();
        assert!(matches!(err, StageError::InvalidPdf { .. }));
    }
}
