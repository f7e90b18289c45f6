//! Shared candidate-harvesting patterns for the text and OCR stages.
//!
//! One table covers the printed forms seen on real documents (dotted boleto
//! groups, hyphenated or spaced arrecadação fields, spaced NF-e key groups)
//! plus bare digit runs. Formatted patterns run against the raw text;
//! generic runs match only after normalization, so codes broken across
//! spaces and separators are still found.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Candidate, Source};

#[derive(Clone, Copy)]
enum Target {
    Raw,
    Normalized,
}

struct Pattern {
    re: Regex,
    target: Target,
}

static PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    let raw = [
        // Arrecadação, dotted field/check-digit groups
        r"\b8\d{10}\s*\.\s*\d\s*\.\s*\d{11}\s*\.\s*\d\s*\.\s*\d{11}\s*\.\s*\d\s*\.\s*\d{11}\s*\.\s*\d\b",
        // Arrecadação, four spaced 12-digit fields
        r"\b8\d{11}\s+\d{12}\s+\d{12}\s+\d{12}\b",
        // Arrecadação, hyphenated check digits
        r"\b8\d{10}\s*-\s*\d\s+\d{11}\s*-\s*\d\s+\d{11}\s*-\s*\d\s+\d{11}\s*-\s*\d\b",
        // Boleto linha digitável, dotted or spaced groups
        r"\b\d{5}[.\s]?\d{5}\s+\d{5}[.\s]?\d{6}\s+\d{5}[.\s]?\d{6}\s+\d\s+\d{14}\b",
        r"\d{11}-\d\s*\d{11}-\d\s*\d{11}-\d\s*\d{11}-\d",
        // NF-e access key printed as eleven groups of four
        r"\b\d{4}(?:\s+\d{4}){10}\b",
        r"\b(?:\d{4}\s?){10}\d{4}\b",
    ];
    let normalized = [r"\d{48}\b", r"\b\d{47}\b", r"\b\d{44}\b"];

    raw.iter()
        .map(|p| Pattern {
            re: Regex::new(p).expect("static pattern"),
            target: Target::Raw,
        })
        .chain(normalized.iter().map(|p| Pattern {
            re: Regex::new(p).expect("static pattern"),
            target: Target::Normalized,
        }))
        .collect()
});

/// Canonical candidate form: whitespace, dots and hyphens removed.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '-')
        .collect()
}

/// Harvest 44/47/48-digit candidates from a block of text, in pattern then
/// textual order, with exact duplicates dropped.
pub fn harvest(text: &str, source: Source) -> Vec<Candidate> {
    let normalized = normalize(text);
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for pattern in PATTERNS.iter() {
        let haystack = match pattern.target {
            Target::Raw => text,
            Target::Normalized => normalized.as_str(),
        };
        for m in pattern.re.find_iter(haystack) {
            let digits = normalize(m.as_str());
            if matches!(digits.len(), 44 | 47 | 48)
                && digits.bytes().all(|b| b.is_ascii_digit())
                && seen.insert(digits.clone())
            {
                out.push(Candidate::new(digits, source));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOLETO_47: &str = "23791234546789012345767890123457398810000012345";
    const ARREC_48: &str = "846700000017123456789015234567890129345678901231";
    const NFE_KEY: &str = "35250711222333000181001000012345125512345677";

    fn digits_of(text: &str) -> Vec<String> {
        harvest(text, Source::Text)
            .into_iter()
            .map(|c| c.digits)
            .collect()
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize("123.456-789 0"), "1234567890");
        assert_eq!(normalize("  \n\t"), "");
    }

    #[test]
    fn test_dotted_boleto_group_form() {
        let text = "Pague até o vencimento\n23791.23454 67890.123457 67890.123457 3 98810000012345\n";
        assert_eq!(digits_of(text), vec![BOLETO_47.to_string()]);
    }

    #[test]
    fn test_hyphenated_arrecadacao_form() {
        let text = "84670000001-7 12345678901-5 23456789012-9 34567890123-1";
        assert_eq!(digits_of(text), vec![ARREC_48.to_string()]);
    }

    #[test]
    fn test_spaced_arrecadacao_form() {
        let text = "846700000017 123456789015 234567890129 345678901231";
        assert_eq!(digits_of(text), vec![ARREC_48.to_string()]);
    }

    #[test]
    fn test_spaced_nfe_key_form() {
        let text = "CHAVE DE ACESSO\n3525 0711 2223 3300 0181 0010 0001 2345 1255 1234 5677";
        assert_eq!(digits_of(text), vec![NFE_KEY.to_string()]);
    }

    #[test]
    fn test_bare_run_found_after_normalization() {
        let text = format!("Linha Digitável: {}", BOLETO_47);
        assert_eq!(digits_of(&text), vec![BOLETO_47.to_string()]);
    }

    #[test]
    fn test_formatted_and_bare_occurrences_dedup() {
        let text = format!(
            "23791.23454 67890.123457 67890.123457 3 98810000012345\n{}",
            BOLETO_47
        );
        assert_eq!(digits_of(&text), vec![BOLETO_47.to_string()]);
    }

    #[test]
    fn test_multiple_codes_all_harvested() {
        let text = format!(
            "boleto {BOLETO_47} e arrecadação {ARREC_48} e chave {NFE_KEY}"
        );
        let found = digits_of(&text);
        assert!(found.contains(&BOLETO_47.to_string()));
        assert!(found.contains(&ARREC_48.to_string()));
        assert!(found.contains(&NFE_KEY.to_string()));
    }

    #[test]
    fn test_unrelated_text_yields_nothing() {
        assert!(digits_of("Nota fiscal 12345, total R$ 1.234,56").is_empty());
    }
}
