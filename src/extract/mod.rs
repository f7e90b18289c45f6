//! Candidate extraction stages and their shared types.
//!
//! Three independent producers feed the ranker: native PDF text, optical
//! symbol decoding on rendered pages, and OCR. All of them emit normalized
//! digit-string candidates tagged with their provenance.

pub mod ocr;
pub mod optical;
pub mod patterns;
pub mod render;
pub mod text;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::Settings;
use crate::error::StageError;

pub use ocr::OcrExtractor;
pub use optical::OpticalExtractor;
pub use text::TextExtractor;

/// Which stage produced a candidate. Serialized with the wire names the
/// downstream submitter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    #[serde(rename = "texto")]
    Text,
    #[serde(rename = "pyzbar")]
    OpticalBarcode,
    #[serde(rename = "ocr")]
    Ocr,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Text => "texto",
            Source::OpticalBarcode => "pyzbar",
            Source::Ocr => "ocr",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "texto" => Ok(Source::Text),
            "pyzbar" => Ok(Source::OpticalBarcode),
            "ocr" => Ok(Source::Ocr),
            other => Err(format!(
                "unknown source '{other}' (expected texto, pyzbar or ocr)"
            )),
        }
    }
}

/// An unvalidated digit string together with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub digits: String,
    pub source: Source,
}

impl Candidate {
    pub fn new(digits: impl Into<String>, source: Source) -> Self {
        Candidate {
            digits: digits.into(),
            source,
        }
    }
}

/// One extraction stage. Implementations never mutate shared state, so a
/// pipeline can hold them across invocations.
pub trait CandidateExtractor: Send + Sync {
    fn source(&self) -> Source;

    fn extract(&self, pdf: &[u8], filename: &str) -> Result<Vec<Candidate>, StageError>;
}

/// Availability of the optional native backends.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub rendering: bool,
    pub ocr: bool,
}

/// Probe the rendering and OCR prerequisites once at startup. Stages whose
/// backend is missing fail with `ConfigurationError` at run time and are
/// skipped; this probe lets the CLI warn up front instead.
pub fn probe(settings: &Settings) -> Capabilities {
    Capabilities {
        rendering: render::available(),
        ocr: ocr::available(settings.tessdata_dir.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_wire_names_round_trip() {
        for source in [Source::Text, Source::OpticalBarcode, Source::Ocr] {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert!("zbar".parse::<Source>().is_err());
    }

    #[test]
    fn test_source_serializes_to_wire_name() {
        assert_eq!(
            serde_json::to_string(&Source::OpticalBarcode).unwrap(),
            "\"pyzbar\""
        );
    }
}
