//! PDF page rasterization through pdfium.
//!
//! The optical and OCR stages both consume page images rendered here. The
//! pdfium library binds dynamically; a missing library is a configuration
//! problem, not a document problem.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::error::StageError;

/// True when the pdfium library can be bound on this host.
pub fn available() -> bool {
    Pdfium::bind_to_system_library().is_ok()
}

/// Render every page of the document at the given DPI.
///
/// Pages that fail to render are logged and skipped; the stage still gets
/// whatever rendered.
pub fn render_pages(pdf: &[u8], dpi: u32, filename: &str) -> Result<Vec<DynamicImage>, StageError> {
    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| StageError::Configuration(format!("pdfium library unavailable: {e}")))?;
    let pdfium = Pdfium::new(bindings);
    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| StageError::InvalidPdf {
            filename: filename.to_string(),
            message: e.to_string(),
        })?;

    let config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
    let mut pages = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        match page.render_with_config(&config) {
            Ok(bitmap) => pages.push(bitmap.as_image()),
            Err(e) => warn!("{filename}: failed to render page {}: {e}", index + 1),
        }
    }
    debug!("{filename}: rendered {} page(s) at {dpi} dpi", pages.len());
    Ok(pages)
}
