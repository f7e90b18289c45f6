//! Leitor - Brazilian payment-slip code extraction
//!
//! This library ingests boleto and arrecadação PDFs and extracts exactly one
//! validated payment code per document, together with the provenance of how
//! it was obtained (native text, optical barcode decoding, or OCR), plus the
//! supplementary metadata needed to file the record downstream.

pub mod batch;
pub mod checksum;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fields;
pub mod pipeline;
pub mod rank;
pub mod soap;
pub mod suppliers;

// Re-export common result type
pub use error::Result;
