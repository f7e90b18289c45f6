//! Error handling for the extraction pipeline
//!
//! Defines the typed stage and pipeline error taxonomy and establishes a
//! unified Result type using anyhow for context chaining at the CLI level.

use thiserror::Error;

/// Failures surfaced by an individual extraction stage.
///
/// The orchestrator logs these and continues with the next stage; only
/// `Configuration` can later surface to the caller, and only when no stage
/// produced a usable candidate.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("{filename}: invalid or corrupted PDF: {message}")]
    InvalidPdf { filename: String, message: String },

    #[error("{filename}: text extraction failed: {message}")]
    TextExtraction { filename: String, message: String },

    #[error("{filename}: OCR produced no usable output: {message}")]
    Ocr { filename: String, message: String },

    #[error("missing prerequisite: {0}")]
    Configuration(String),
}

impl StageError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, StageError::Configuration(_))
    }
}

/// Terminal pipeline outcomes.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// All stages exhausted without a usable payment code. Any NF-e access
    /// keys seen along the way are kept so the caller can report "DANFE
    /// present but no boleto".
    #[error("{filename}: no boleto or arrecadação code found ({} NF-e access key(s) rejected)", .nfe_keys.len())]
    BarcodeNotFound {
        filename: String,
        nfe_keys: Vec<String>,
    },

    #[error("missing prerequisite: {0}")]
    Configuration(String),
}

/// Check-digit functions reject anything that is not a non-empty digit run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumError {
    #[error("input is empty or contains non-digit characters")]
    InvalidDigitString,
}

/// Result type alias for CLI-level operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_formatting_is_readable() {
        let err = StageError::InvalidPdf {
            filename: "fatura.pdf".to_string(),
            message: "bad xref".to_string(),
        };
        assert_eq!(err.to_string(), "fatura.pdf: invalid or corrupted PDF: bad xref");
        assert!(!err.is_configuration());
        assert!(StageError::Configuration("pdfium".to_string()).is_configuration());
    }

    #[test]
    fn test_not_found_mentions_rejected_nfe_count() {
        let err = PipelineError::BarcodeNotFound {
            filename: "danfe.pdf".to_string(),
            nfe_keys: vec!["1".to_string(), "2".to_string()],
        };
        assert!(err.to_string().contains("2 NF-e access key(s) rejected"));
    }
}
