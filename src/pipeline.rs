//! The extraction pipeline: runs the stages in a fixed priority order and
//! selects a single winning payment code.
//!
//! Stage order is Text, then OpticalBarcode, then OCR. Candidates accumulate
//! across stages in global insertion order and are re-ranked after each
//! stage; the first stage whose ranking yields a winner short-circuits the
//! rest. Stage errors are logged and treated as empty output, except that a
//! `ConfigurationError` is remembered and surfaced in preference to
//! `BarcodeNotFound` when nothing was found at all.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::classify::BarcodeKind;
use crate::config::Settings;
use crate::error::{PipelineError, StageError};
use crate::extract::{
    Candidate, CandidateExtractor, OcrExtractor, OpticalExtractor, Source, TextExtractor,
};
use crate::rank;

/// The pipeline's return value: a winning digit string with its classified
/// kind and the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCode {
    pub digits: String,
    pub kind: BarcodeKind,
    pub source: Source,
}

pub struct ExtractionPipeline {
    stages: Vec<Box<dyn CandidateExtractor>>,
}

impl ExtractionPipeline {
    /// Default stage set in priority order.
    pub fn new(settings: &Settings) -> Self {
        Self::with_stages(vec![
            Box::new(TextExtractor::new()),
            Box::new(OpticalExtractor::new(settings.ocr_dpi)),
            Box::new(OcrExtractor::new(
                settings.ocr_dpi,
                settings.tessdata_dir.clone(),
            )),
        ])
    }

    /// Build a pipeline over an explicit stage list. Tests inject doubles
    /// here; production code uses [`ExtractionPipeline::new`].
    pub fn with_stages(stages: Vec<Box<dyn CandidateExtractor>>) -> Self {
        ExtractionPipeline { stages }
    }

    /// Run the stages against one document and pick the winner.
    pub fn extract(&self, pdf: &[u8], filename: &str) -> Result<PaymentCode, PipelineError> {
        let mut pool: Vec<Candidate> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut nfe_keys: Vec<String> = Vec::new();
        let mut configuration: Option<String> = None;

        for stage in &self.stages {
            match stage.extract(pdf, filename) {
                Ok(candidates) => {
                    for candidate in candidates {
                        // first occurrence wins; provenance stays with the
                        // earliest stage that saw the code
                        if seen.insert(candidate.digits.clone()) {
                            pool.push(candidate);
                        }
                    }
                }
                Err(e) => {
                    warn!("{filename}: {} stage failed: {e}", stage.source());
                    if let StageError::Configuration(message) = &e {
                        configuration.get_or_insert_with(|| message.clone());
                    }
                }
            }

            let ranking = rank::rank(&pool);
            for key in &ranking.rejected_nfe {
                if !nfe_keys.contains(key) {
                    nfe_keys.push(key.clone());
                }
            }
            if let Some(winner) = ranking.winner() {
                info!(
                    "{filename}: payment code found via {} ({})",
                    winner.source,
                    winner.kind.as_str()
                );
                return Ok(PaymentCode {
                    digits: winner.digits.clone(),
                    kind: winner.kind,
                    source: winner.source,
                });
            }
        }

        if let Some(message) = configuration {
            return Err(PipelineError::Configuration(message));
        }
        if !nfe_keys.is_empty() {
            warn!(
                "{filename}: only NF-e access keys present: {}",
                nfe_keys.join(", ")
            );
        }
        Err(PipelineError::BarcodeNotFound {
            filename: filename.to_string(),
            nfe_keys,
        })
    }
}
