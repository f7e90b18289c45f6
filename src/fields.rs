//! Supplementary metadata harvested from the document text.
//!
//! Payment slips processed here come out of an ERP flow that stamps the NF
//! number, the internal Fluxus id and the supplier block onto the page.
//! Every field is best-effort; absence is not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentFields {
    /// "Número da NF"
    pub nf_number: Option<String>,
    /// "ID. NF"
    pub nf_id: Option<String>,
    /// Internal flow identifier ("ID.Fluxus")
    pub id_fluxus: Option<String>,
    /// Supplier name
    pub fornecedor: Option<String>,
    /// Supplier tax identifier as printed (may keep punctuation)
    pub cnpj: Option<String>,
}

static NF_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Número da NF:\s*(\d+)").expect("static pattern"));

static NF_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"ID\. NF:\s*(\d+)").expect("static pattern"));

static FLUXUS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"ID\.?\s*Fluxus\s*:?\s*(\d+)",
        r"Fluxus\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Tabular fallback for the flow id: a 7-digit id followed by a 12-digit
/// document number and a short date.
static FLUXUS_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{7})\s+\d{12}\s+\d{2}/\d{2}/\d{2}").expect("static pattern"));

static FORNECEDOR: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Fornecedor:\s*F\d+\s+([^\n]+?)\s+CNPJ:",
        r"Fornecedor:\s*([^\n]+)",
        r"F\d+\s+([^\n]+?)\s+CNPJ",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

static CNPJ: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"CNPJ:\s*([\d./-]+)",
        r"CNPJ\s+([\d./-]+)",
        r"CNPJ/CPF:?\s*([\d./-]+)",
        r"CPF/CNPJ:\s*([\d./-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

/// Harvest the supplementary fields from extracted document text.
pub fn harvest_fields(text: &str) -> DocumentFields {
    let id_fluxus = first_match(&FLUXUS, text).or_else(|| {
        FLUXUS_TABLE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    });

    DocumentFields {
        nf_number: NF_NUMBER
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        nf_id: NF_ID
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        id_fluxus,
        fornecedor: first_match(&FORNECEDOR, text),
        cnpj: first_match(&CNPJ, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_header_block() {
        let text = "Número da NF: 4521\nID. NF: 99881\nID.Fluxus 1234567\n\
                    Fornecedor: F0042 TRANSPORTES AURORA LTDA CNPJ: 11.222.333/0001-81\n";
        let fields = harvest_fields(text);
        assert_eq!(fields.nf_number.as_deref(), Some("4521"));
        assert_eq!(fields.nf_id.as_deref(), Some("99881"));
        assert_eq!(fields.id_fluxus.as_deref(), Some("1234567"));
        assert_eq!(fields.fornecedor.as_deref(), Some("TRANSPORTES AURORA LTDA"));
        assert_eq!(fields.cnpj.as_deref(), Some("11.222.333/0001-81"));
    }

    #[test]
    fn test_fluxus_spelling_variants() {
        for text in [
            "ID.Fluxus 7654321",
            "ID. Fluxus 7654321",
            "ID Fluxus: 7654321",
            "Fluxus 7654321",
        ] {
            assert_eq!(
                harvest_fields(text).id_fluxus.as_deref(),
                Some("7654321"),
                "variant: {text}"
            );
        }
    }

    #[test]
    fn test_fluxus_tabular_fallback() {
        let text = "lançamentos\n9876543 202501000045 12/01/25 pago\n";
        assert_eq!(harvest_fields(text).id_fluxus.as_deref(), Some("9876543"));
    }

    #[test]
    fn test_cnpj_label_variants() {
        for text in [
            "CNPJ: 11.222.333/0001-81",
            "CNPJ 11.222.333/0001-81",
            "CNPJ/CPF: 11.222.333/0001-81",
            "CPF/CNPJ: 11.222.333/0001-81",
        ] {
            assert_eq!(
                harvest_fields(text).cnpj.as_deref(),
                Some("11.222.333/0001-81"),
                "variant: {text}"
            );
        }
    }

    #[test]
    fn test_absent_fields_stay_none() {
        assert_eq!(harvest_fields("documento sem cabeçalho"), DocumentFields::default());
    }
}
