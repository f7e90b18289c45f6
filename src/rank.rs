//! Candidate ranking: NF-e exclusion, shape screening and checksum-based
//! prioritization.
//!
//! The output is a totally ordered sequence; the orchestrator only ever
//! consumes the head, but the full list is computed so the selection stays
//! monotone as later stages contribute more candidates.

use tracing::debug;

use crate::classify::{self, BarcodeKind};
use crate::extract::{Candidate, Source};

/// How far a ranked candidate got through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Checksums verified for its kind.
    Validated,
    /// 44-digit boleto barcode form, accepted by shape without a checksum.
    Admitted,
    /// Plausible shape but failed checksums; kept last as a hedge against
    /// imperfect OCR, never returned as a winner.
    ShapeOnly,
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub digits: String,
    pub source: Source,
    pub kind: BarcodeKind,
    pub validation: Validation,
}

/// Ranked candidates plus the NF-e access keys that were filtered out, kept
/// for diagnostics.
#[derive(Debug, Default)]
pub struct Ranking {
    pub ordered: Vec<RankedCandidate>,
    pub rejected_nfe: Vec<String>,
}

impl Ranking {
    /// Highest-priority candidate eligible to be returned by the pipeline.
    pub fn winner(&self) -> Option<&RankedCandidate> {
        self.ordered
            .first()
            .filter(|c| c.validation != Validation::ShapeOnly)
    }
}

/// Rank candidates by (kind priority, insertion order): validated boletos,
/// then validated arrecadações, then admitted 44-digit barcode forms, then
/// shape-only leftovers. NF-e access keys are unconditionally excluded.
pub fn rank(candidates: &[Candidate]) -> Ranking {
    let mut boletos = Vec::new();
    let mut arrecadacoes = Vec::new();
    let mut admitted = Vec::new();
    let mut leftovers = Vec::new();
    let mut rejected_nfe: Vec<String> = Vec::new();

    for candidate in candidates {
        if classify::is_nfe_access_key(&candidate.digits) {
            debug!("discarding NF-e access key: {}", candidate.digits);
            if !rejected_nfe.contains(&candidate.digits) {
                rejected_nfe.push(candidate.digits.clone());
            }
            continue;
        }
        if !classify::looks_like_payment_slip(&candidate.digits) {
            debug!("discarding unrelated digit run: {}", candidate.digits);
            continue;
        }

        let kind = classify::classify(&candidate.digits);
        let ranked = |validation| RankedCandidate {
            digits: candidate.digits.clone(),
            source: candidate.source,
            kind,
            validation,
        };
        match kind {
            BarcodeKind::Boleto if candidate.digits.len() == 44 => {
                admitted.push(ranked(Validation::Admitted));
            }
            BarcodeKind::Boleto if classify::validate_boleto(&candidate.digits) => {
                boletos.push(ranked(Validation::Validated));
            }
            BarcodeKind::Arrecadacao if classify::validate_arrecadacao(&candidate.digits) => {
                arrecadacoes.push(ranked(Validation::Validated));
            }
            _ => leftovers.push(ranked(Validation::ShapeOnly)),
        }
    }

    let mut ordered = boletos;
    ordered.append(&mut arrecadacoes);
    ordered.append(&mut admitted);
    ordered.append(&mut leftovers);
    Ranking {
        ordered,
        rejected_nfe,
    }
}
