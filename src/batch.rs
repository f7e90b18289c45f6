//! Batch processing of PDF files on a bounded worker pool.
//!
//! Each invocation stages its input bytes into an exclusive scratch
//! directory under the configured temp dir and removes it on every exit
//! path. One file's failure never aborts the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::PipelineError;
use crate::extract::{ocr, text, Source};
use crate::fields::{self, DocumentFields};
use crate::pipeline::ExtractionPipeline;
use crate::suppliers::SupplierMap;

/// Per-file processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "processado")]
    Processed,
    #[serde(rename = "nao_encontrado")]
    NotFound,
    #[serde(rename = "erro")]
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Processed => "processado",
            Status::NotFound => "nao_encontrado",
            Status::Error => "erro",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    pub barcode: Option<String>,
    pub barcode_source: Option<Source>,
    pub fields: DocumentFields,
    /// Payer id resolved from the supplier list, when a CNPJ was found.
    pub idpgto: Option<i64>,
    pub status: Status,
    pub error: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl FileOutcome {
    fn error(filename: &str, message: String) -> Self {
        FileOutcome {
            filename: filename.to_string(),
            barcode: None,
            barcode_source: None,
            fields: DocumentFields::default(),
            idpgto: None,
            status: Status::Error,
            error: Some(message),
            processed_at: Utc::now(),
        }
    }
}

struct StagedInput {
    // Held for its Drop: the scratch directory disappears with this value
    _dir: TempDir,
    path: PathBuf,
}

fn stage_input(bytes: &[u8], settings: &Settings) -> crate::Result<StagedInput> {
    std::fs::create_dir_all(&settings.temp_dir)?;
    let dir = tempfile::Builder::new()
        .prefix("leitor-")
        .tempdir_in(&settings.temp_dir)?;
    let path = dir.path().join("input.pdf");
    std::fs::write(&path, bytes)?;
    Ok(StagedInput { _dir: dir, path })
}

/// Process one PDF end to end: stage it, harvest the supplementary fields
/// and run the extraction pipeline.
pub fn process_file(
    bytes: &[u8],
    filename: &str,
    settings: &Settings,
    suppliers: Option<&SupplierMap>,
) -> FileOutcome {
    let staged = match stage_input(bytes, settings) {
        Ok(staged) => staged,
        Err(e) => {
            error!("{filename}: failed to stage input: {e:#}");
            return FileOutcome::error(filename, format!("failed to stage input: {e}"));
        }
    };
    let bytes = match std::fs::read(&staged.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("{filename}: failed to read staged input: {e}");
            return FileOutcome::error(filename, format!("failed to read staged input: {e}"));
        }
    };

    // Supplementary fields come from the document text; scans without any
    // embedded text fall back to OCR
    let mut doc_text = match text::document_text(&bytes, filename) {
        Ok(text) => text,
        Err(e) => {
            warn!("{filename}: text extraction for fields failed: {e}");
            String::new()
        }
    };
    if doc_text.trim().is_empty() {
        match ocr::recognize_text(
            &bytes,
            settings.ocr_dpi,
            settings.tessdata_dir.as_deref(),
            filename,
        ) {
            Ok(text) => doc_text = text,
            Err(e) => warn!("{filename}: OCR fallback for fields failed: {e}"),
        }
    }
    let doc_fields = fields::harvest_fields(&doc_text);
    let idpgto = doc_fields
        .cnpj
        .as_deref()
        .and_then(|cnpj| suppliers.and_then(|map| map.lookup(cnpj)));

    let pipeline = ExtractionPipeline::new(settings);
    match pipeline.extract(&bytes, filename) {
        Ok(code) => {
            info!("{filename}: extracted {} via {}", code.digits, code.source);
            FileOutcome {
                filename: filename.to_string(),
                barcode: Some(code.digits),
                barcode_source: Some(code.source),
                fields: doc_fields,
                idpgto,
                status: Status::Processed,
                error: None,
                processed_at: Utc::now(),
            }
        }
        Err(e @ PipelineError::BarcodeNotFound { .. }) => {
            warn!("{filename}: {e}");
            FileOutcome {
                filename: filename.to_string(),
                barcode: None,
                barcode_source: None,
                fields: doc_fields,
                idpgto,
                status: Status::NotFound,
                error: Some(e.to_string()),
                processed_at: Utc::now(),
            }
        }
        Err(e) => {
            error!("{filename}: {e}");
            FileOutcome {
                filename: filename.to_string(),
                barcode: None,
                barcode_source: None,
                fields: doc_fields,
                idpgto,
                status: Status::Error,
                error: Some(e.to_string()),
                processed_at: Utc::now(),
            }
        }
    }
}

/// Process many files with at most `max_workers` invocations in flight.
/// Results come back in input order.
pub async fn process_files(
    paths: &[String],
    settings: &Settings,
    suppliers: Option<Arc<SupplierMap>>,
) -> Vec<FileOutcome> {
    let semaphore = Arc::new(Semaphore::new(settings.max_workers.max(1)));
    let mut handles = Vec::with_capacity(paths.len());

    for path in paths {
        let semaphore = semaphore.clone();
        let settings = settings.clone();
        let suppliers = suppliers.clone();
        let path = path.clone();
        handles.push((
            path.clone(),
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || {
                    let filename = Path::new(&path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    match std::fs::read(&path) {
                        Ok(bytes) => {
                            process_file(&bytes, &filename, &settings, suppliers.as_deref())
                        }
                        Err(e) => FileOutcome::error(&filename, format!("failed to read file: {e}")),
                    }
                })
                .await
            }),
        ));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        match handle.await {
            Ok(Ok(outcome)) => results.push(outcome),
            Ok(Err(e)) | Err(e) => {
                error!("{path}: worker failed: {e}");
                results.push(FileOutcome::error(&path, format!("worker failed: {e}")));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_input_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings {
            temp_dir: root.path().to_path_buf(),
            ..Settings::default()
        };
        let staged_path;
        {
            let staged = stage_input(b"%PDF-1.4 fake", &settings).unwrap();
            staged_path = staged.path.clone();
            assert!(staged_path.exists());
        }
        assert!(!staged_path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unreadable_pdf_yields_error_outcome() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings {
            temp_dir: root.path().to_path_buf(),
            ..Settings::default()
        };
        let outcome = process_file(b"not a pdf", "garbage.pdf", &settings, None);
        // every stage fails on garbage bytes, so no code can be found
        assert_ne!(outcome.status, Status::Processed);
        assert!(outcome.barcode.is_none());
        // the scratch space is gone regardless
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
