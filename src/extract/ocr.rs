//! Portuguese OCR over grayscale page renders.

use image::DynamicImage;
use kreuzberg_tesseract::TesseractAPI;
use tracing::{debug, warn};

use crate::error::StageError;

use super::{patterns, render, Candidate, CandidateExtractor, Source};

const OCR_LANG: &str = "por";

/// True when a tesseract instance can be initialized with the Portuguese
/// trained data.
pub fn available(tessdata_dir: Option<&str>) -> bool {
    let mut api = TesseractAPI::new();
    api.init(tessdata_dir.unwrap_or(""), OCR_LANG).is_ok()
}

/// Recognize the full document text. Shared with the metadata harvester,
/// which falls back to OCR when a scan has no embedded text.
pub fn recognize_text(
    pdf: &[u8],
    dpi: u32,
    tessdata_dir: Option<&str>,
    filename: &str,
) -> Result<String, StageError> {
    let pages = render::render_pages(pdf, dpi, filename)?;
    if pages.is_empty() {
        return Err(StageError::Ocr {
            filename: filename.to_string(),
            message: "no pages rendered".to_string(),
        });
    }

    let mut recognized = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        match ocr_page(page, tessdata_dir, filename) {
            Ok(text) => recognized.push(text),
            // A missing backend aborts the stage; a bad page does not
            Err(e @ StageError::Configuration(_)) => return Err(e),
            Err(e) => {
                warn!("{filename}: OCR failed on page {}: {e}", index + 1);
                recognized.push(String::new());
            }
        }
    }

    let text = recognized.join("\n");
    if text.trim().is_empty() {
        return Err(StageError::Ocr {
            filename: filename.to_string(),
            message: "no text recognized".to_string(),
        });
    }
    debug!("{filename}: OCR recognized {} chars", text.len());
    Ok(text)
}

fn ocr_page(
    page: &DynamicImage,
    tessdata_dir: Option<&str>,
    filename: &str,
) -> Result<String, StageError> {
    let gray = page.to_luma8();
    let (width, height) = gray.dimensions();

    let mut api = TesseractAPI::new();
    api.init(tessdata_dir.unwrap_or(""), OCR_LANG)
        .map_err(|e| StageError::Configuration(format!("tesseract init failed: {e}")))?;
    api.set_image(
        gray.as_raw(),
        width as i32,
        height as i32,
        1,
        width as i32,
    )
    .map_err(|e| StageError::Ocr {
        filename: filename.to_string(),
        message: format!("set_image failed: {e}"),
    })?;
    api.get_utf8_text().map_err(|e| StageError::Ocr {
        filename: filename.to_string(),
        message: format!("recognition failed: {e}"),
    })
}

pub struct OcrExtractor {
    dpi: u32,
    tessdata_dir: Option<String>,
}

impl OcrExtractor {
    pub fn new(dpi: u32, tessdata_dir: Option<String>) -> Self {
        OcrExtractor { dpi, tessdata_dir }
    }
}

impl CandidateExtractor for OcrExtractor {
    fn source(&self) -> Source {
        Source::Ocr
    }

    fn extract(&self, pdf: &[u8], filename: &str) -> Result<Vec<Candidate>, StageError> {
        let text = recognize_text(pdf, self.dpi, self.tessdata_dir.as_deref(), filename)?;
        Ok(patterns::harvest(&text, Source::Ocr))
    }
}
