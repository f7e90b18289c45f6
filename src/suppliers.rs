//! Supplier CNPJ/CPF to payer-id (IDPGTO) mapping.
//!
//! Loaded once at startup from a semicolon-delimited CSV and shared
//! read-only; only the SOAP submitter consults it.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use tracing::{info, warn};

#[derive(Debug, Default, Clone)]
pub struct SupplierMap {
    entries: HashMap<String, i64>,
}

fn only_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

impl SupplierMap {
    /// Load the supplier list. The header row must contain `IDPGTO` and
    /// `CNPJ/CPF`; malformed rows are logged and skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open supplier CSV {path:?}"))?;

        let headers = reader
            .headers()
            .context("failed to read supplier CSV headers")?
            .clone();
        let id_idx = column(&headers, "IDPGTO")?;
        let tax_idx = column(&headers, "CNPJ/CPF")?;

        let mut entries = HashMap::new();
        for (idx, record) in reader.records().enumerate() {
            let row = idx + 2;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!("skipping supplier row {row}: {e}");
                    continue;
                }
            };
            let raw_id = record.get(id_idx).unwrap_or("").trim();
            let Ok(idpgto) = raw_id.parse::<i64>() else {
                warn!("skipping supplier row {row}: invalid IDPGTO {raw_id:?}");
                continue;
            };
            let key = only_digits(record.get(tax_idx).unwrap_or(""));
            if key.is_empty() {
                warn!("skipping supplier row {row}: empty CNPJ/CPF");
                continue;
            }
            entries.insert(key, idpgto);
        }

        info!("loaded {} supplier mapping(s) from {path:?}", entries.len());
        Ok(SupplierMap { entries })
    }

    /// Look up a payer id by a possibly formatted CNPJ (14 digits) or CPF
    /// (11 digits).
    pub fn lookup(&self, tax_id: &str) -> Option<i64> {
        let digits = only_digits(tax_id);
        if !matches!(digits.len(), 11 | 14) {
            return None;
        }
        self.entries.get(&digits).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| anyhow!("supplier CSV is missing the {name} column"))
}
