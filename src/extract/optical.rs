//! Direct symbol decoding on rendered page images.
//!
//! Scanned boletos usually carry an ITF barcode whose payload is the
//! 44-digit transport form, so a successful decode here is the raw barcode
//! rather than a linha digitável.

use tracing::{debug, warn};

use crate::error::StageError;

use super::{patterns, render, Candidate, CandidateExtractor, Source};

pub struct OpticalExtractor {
    dpi: u32,
}

impl OpticalExtractor {
    pub fn new(dpi: u32) -> Self {
        OpticalExtractor { dpi }
    }
}

impl CandidateExtractor for OpticalExtractor {
    fn source(&self) -> Source {
        Source::OpticalBarcode
    }

    fn extract(&self, pdf: &[u8], filename: &str) -> Result<Vec<Candidate>, StageError> {
        let pages = render::render_pages(pdf, self.dpi, filename)?;
        let mut out = Vec::new();

        for (index, page) in pages.into_iter().enumerate() {
            let gray = page.to_luma8();
            let (width, height) = gray.dimensions();
            match rxing::helpers::detect_multiple_in_luma(gray.into_raw(), width, height) {
                Ok(symbols) => {
                    for symbol in symbols {
                        let digits = patterns::normalize(symbol.getText());
                        if matches!(digits.len(), 44 | 47 | 48)
                            && digits.bytes().all(|b| b.is_ascii_digit())
                        {
                            debug!(
                                "{filename}: decoded symbol on page {}: {digits}",
                                index + 1
                            );
                            out.push(Candidate::new(digits, Source::OpticalBarcode));
                        } else {
                            debug!(
                                "{filename}: ignoring non payment-code symbol on page {}",
                                index + 1
                            );
                        }
                    }
                }
                // A page without a decodable symbol is normal, not a failure
                Err(e) => debug!("{filename}: no symbol decoded on page {}: {e}", index + 1),
            }
        }

        if out.is_empty() {
            warn!("{filename}: optical stage decoded no payment-code symbol");
        }
        Ok(out)
    }
}
