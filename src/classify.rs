//! Structural classification and checksum validation of payment-code digit
//! strings.
//!
//! Brazilian payment codes share digit lengths with NF-e access keys, so the
//! classifier distinguishes them structurally before any checksum runs:
//! boletos carry a 47-digit linha digitável (44-digit barcode form), utility
//! arrecadação slips a 48-digit one, and NF-e access keys are 44 digits with
//! a state code prefix and a document-model field.

use crate::checksum;

/// What a normalized digit string appears to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeKind {
    Boleto,
    Arrecadacao,
    Nfe,
    Unknown,
}

impl BarcodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeKind::Boleto => "boleto",
            BarcodeKind::Arrecadacao => "arrecadacao",
            BarcodeKind::Nfe => "nfe",
            BarcodeKind::Unknown => "desconhecido",
        }
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// NF-e access-key structural test: 44 digits, state code (first two digits)
/// in 11..=53 and document model (digits 34..36) one of 55, 65 or 57.
pub fn is_nfe_access_key(digits: &str) -> bool {
    if digits.len() != 44 || !all_digits(digits) {
        return false;
    }
    let uf: u32 = digits[..2].parse().unwrap_or(0);
    (11..=53).contains(&uf) && matches!(&digits[34..36], "55" | "65" | "57")
}

/// Classify a normalized digit string by length and structure. No checksum
/// is consulted here.
pub fn classify(digits: &str) -> BarcodeKind {
    if !all_digits(digits) {
        return BarcodeKind::Unknown;
    }
    match digits.len() {
        44 if is_nfe_access_key(digits) => BarcodeKind::Nfe,
        44 if matches!(digits.as_bytes()[0], b'1'..=b'9') => BarcodeKind::Boleto,
        47 => BarcodeKind::Boleto,
        48 => BarcodeKind::Arrecadacao,
        _ => BarcodeKind::Unknown,
    }
}

/// Cheap shape screen applied before checksum validation to drop digit runs
/// that are clearly unrelated: 47 digits starting 1..9 (bank code), 48
/// digits starting 8, or a 44-digit non-NF-e starting 1..9.
pub fn looks_like_payment_slip(digits: &str) -> bool {
    if !all_digits(digits) {
        return false;
    }
    let first = digits.as_bytes()[0];
    match digits.len() {
        47 => matches!(first, b'1'..=b'9'),
        48 => first == b'8',
        44 => matches!(first, b'1'..=b'9') && !is_nfe_access_key(digits),
        _ => false,
    }
}

/// Rebuild the 44-digit barcode from a 47-digit linha digitável.
///
/// Field layout per FEBRABAN: bank+currency, general check digit, due-date
/// factor and amount, then the three free-field slices with their per-field
/// check digits elided.
pub fn barcode_from_linha(linha: &str) -> String {
    debug_assert_eq!(linha.len(), 47);
    let mut barcode = String::with_capacity(44);
    barcode.push_str(&linha[0..4]);
    barcode.push_str(&linha[32..33]);
    barcode.push_str(&linha[33..37]);
    barcode.push_str(&linha[37..47]);
    barcode.push_str(&linha[4..9]);
    barcode.push_str(&linha[10..20]);
    barcode.push_str(&linha[21..31]);
    barcode
}

/// Validate a 47-digit boleto linha digitável: Mod-10 on the three fields
/// (each with its trailing check digit), then Mod-11 FEBRABAN on the
/// reconstructed barcode's general check digit at position 4.
pub fn validate_boleto(linha: &str) -> bool {
    if linha.len() != 47 || !all_digits(linha) {
        return false;
    }
    for (start, end) in [(0, 10), (10, 21), (21, 32)] {
        if !checksum::mod10_verify(&linha[start..end]) {
            return false;
        }
    }
    let barcode = barcode_from_linha(linha);
    let body = format!("{}{}", &barcode[..4], &barcode[5..]);
    let dv = u32::from(barcode.as_bytes()[4] - b'0');
    matches!(checksum::mod11_febraban_check_digit(&body), Ok(d) if d == dv)
}

/// Validate a 48-digit arrecadação linha digitável. The third digit selects
/// the per-field algorithm: 6/7 use Mod-10, 8/9 use Mod-11 FEBRABAN. All
/// four 12-digit fields carry their own check digit.
pub fn validate_arrecadacao(linha: &str) -> bool {
    if linha.len() != 48 || !all_digits(linha) {
        return false;
    }
    let verify: fn(&str) -> bool = match linha.as_bytes()[2] {
        b'6' | b'7' => checksum::mod10_verify,
        b'8' | b'9' => checksum::mod11_febraban_verify,
        _ => return false,
    };
    (0..4).all(|i| verify(&linha[i * 12..(i + 1) * 12]))
}

/// Classify and checksum-check in one step. The 44-digit boleto barcode is a
/// transport form: it classifies as Boleto but is never checksum-validated
/// on its own, so it reports false here.
pub fn validate(digits: &str) -> (bool, BarcodeKind) {
    match classify(digits) {
        BarcodeKind::Boleto if digits.len() == 47 => (validate_boleto(digits), BarcodeKind::Boleto),
        BarcodeKind::Boleto => (false, BarcodeKind::Boleto),
        BarcodeKind::Arrecadacao => (validate_arrecadacao(digits), BarcodeKind::Arrecadacao),
        BarcodeKind::Nfe => (checksum::mod11_nfe_verify(digits), BarcodeKind::Nfe),
        BarcodeKind::Unknown => (false, BarcodeKind::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Constructed with genuinely valid FEBRABAN check digits
    const BOLETO_47: &str = "23791234546789012345767890123457398810000012345";
    const BOLETO_47_B: &str = "34190912300045670089700112233440891020000089990";
    const BOLETO_44: &str = "23793988100000123451234567890123456789012345";
    const ARREC_MOD10: &str = "846700000017123456789015234567890129345678901231";
    const ARREC_MOD11: &str = "848200000018111111111112222222222224333333333336";
    const NFE_KEY: &str = "35250711222333000181001000012345125512345677";

    #[test]
    fn test_classify_by_length_and_structure() {
        assert_eq!(classify(BOLETO_47), BarcodeKind::Boleto);
        assert_eq!(classify(BOLETO_44), BarcodeKind::Boleto);
        assert_eq!(classify(ARREC_MOD10), BarcodeKind::Arrecadacao);
        assert_eq!(classify(NFE_KEY), BarcodeKind::Nfe);
        assert_eq!(classify("123456"), BarcodeKind::Unknown);
        assert_eq!(classify(""), BarcodeKind::Unknown);
        assert_eq!(classify(&BOLETO_47.replace('2', "x")), BarcodeKind::Unknown);
    }

    #[test]
    fn test_nfe_access_key_detection() {
        assert!(is_nfe_access_key(NFE_KEY));
        // state code 99 is out of range
        let bad_uf = format!("99{}", &NFE_KEY[2..]);
        assert!(!is_nfe_access_key(&bad_uf));
        // model digits outside {55, 65, 57}
        assert!(!is_nfe_access_key(BOLETO_44));
        assert!(!is_nfe_access_key(BOLETO_47));
    }

    #[test]
    fn test_shape_predicate() {
        assert!(looks_like_payment_slip(BOLETO_47));
        assert!(looks_like_payment_slip(ARREC_MOD10));
        assert!(looks_like_payment_slip(BOLETO_44));
        assert!(!looks_like_payment_slip(NFE_KEY));
        // 47 digits with a leading zero fails the bank-code screen
        assert!(!looks_like_payment_slip(&format!("0{}", &BOLETO_47[1..])));
        // arrecadação must start with 8
        assert!(!looks_like_payment_slip(&format!("7{}", &ARREC_MOD10[1..])));
    }

    #[test]
    fn test_barcode_reconstruction() {
        assert_eq!(barcode_from_linha(BOLETO_47), BOLETO_44);
        assert_eq!(barcode_from_linha(BOLETO_47).len(), 44);
    }

    #[test]
    fn test_validate_boleto() {
        assert!(validate_boleto(BOLETO_47));
        assert!(validate_boleto(BOLETO_47_B));
        assert!(validate_boleto(
            "00190000090114971860168524522114675860000102656"
        ));
        // break a field check digit
        let mut bad = BOLETO_47.to_string();
        bad.replace_range(9..10, "0");
        assert!(!validate_boleto(&bad));
        // break the general check digit
        let mut bad_dv = BOLETO_47.to_string();
        bad_dv.replace_range(32..33, "9");
        assert!(!validate_boleto(&bad_dv));
        assert!(!validate_boleto("1234"));
    }

    #[test]
    fn test_validate_arrecadacao_both_algorithms() {
        assert!(validate_arrecadacao(ARREC_MOD10));
        assert!(validate_arrecadacao(ARREC_MOD11));
        let mut bad = ARREC_MOD10.to_string();
        bad.replace_range(11..12, "9");
        assert!(!validate_arrecadacao(&bad));
        // unsupported type digit
        let mut bad_type = ARREC_MOD10.to_string();
        bad_type.replace_range(2..3, "5");
        assert!(!validate_arrecadacao(&bad_type));
    }

    #[test]
    fn test_validate_dispatch() {
        assert_eq!(validate(BOLETO_47), (true, BarcodeKind::Boleto));
        assert_eq!(validate(ARREC_MOD11), (true, BarcodeKind::Arrecadacao));
        assert_eq!(validate(BOLETO_44), (false, BarcodeKind::Boleto));
        assert_eq!(validate(NFE_KEY), (true, BarcodeKind::Nfe));
        assert_eq!(validate("abc"), (false, BarcodeKind::Unknown));
    }
}
