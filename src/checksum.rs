//! FEBRABAN check-digit arithmetic (Mod-10 and Mod-11) plus the NF-e Mod-11
//! variant.
//!
//! Every function walks the digit string right to left. Compute mode returns
//! the check digit for the whole input; verify mode treats the last digit as
//! the check digit and compares it against the computed one.

use crate::error::ChecksumError;

fn digit_values(field: &str) -> Result<Vec<u32>, ChecksumError> {
    if field.is_empty() {
        return Err(ChecksumError::InvalidDigitString);
    }
    field
        .chars()
        .map(|c| c.to_digit(10).ok_or(ChecksumError::InvalidDigitString))
        .collect()
}

fn verify_with(field: &str, compute: fn(&str) -> Result<u32, ChecksumError>) -> bool {
    if !field.is_ascii() || field.len() < 2 {
        return false;
    }
    let Some(dv) = field.chars().last().and_then(|c| c.to_digit(10)) else {
        return false;
    };
    matches!(compute(&field[..field.len() - 1]), Ok(d) if d == dv)
}

/// Mod-10 check digit: alternating weights 2,1 from the right, products of
/// two digits collapse to their digit sum.
pub fn mod10_check_digit(field: &str) -> Result<u32, ChecksumError> {
    let digits = digit_values(field)?;
    let mut sum = 0u32;
    for (i, d) in digits.iter().rev().enumerate() {
        let weight = if i % 2 == 0 { 2 } else { 1 };
        let mut product = d * weight;
        if product >= 10 {
            product -= 9;
        }
        sum += product;
    }
    Ok((10 - sum % 10) % 10)
}

/// Verify a field whose last digit is its Mod-10 check digit.
pub fn mod10_verify(field: &str) -> bool {
    verify_with(field, mod10_check_digit)
}

fn mod11_remainder(field: &str) -> Result<u32, ChecksumError> {
    let digits = digit_values(field)?;
    let mut sum = 0u32;
    let mut weight = 2u32;
    for d in digits.iter().rev() {
        sum += d * weight;
        weight = if weight < 9 { weight + 1 } else { 2 };
    }
    Ok(sum % 11)
}

/// Mod-11 check digit under the FEBRABAN rule: remainders 0, 1 and 10 all
/// map to check digit 0.
pub fn mod11_febraban_check_digit(field: &str) -> Result<u32, ChecksumError> {
    let r = mod11_remainder(field)?;
    Ok(match r {
        0 | 1 | 10 => 0,
        _ => 11 - r,
    })
}

pub fn mod11_febraban_verify(field: &str) -> bool {
    verify_with(field, mod11_febraban_check_digit)
}

/// Mod-11 check digit under the NF-e rule: only remainders 0 and 1 map to 0,
/// so remainder 10 yields 1 where FEBRABAN yields 0.
pub fn mod11_nfe_check_digit(field: &str) -> Result<u32, ChecksumError> {
    let r = mod11_remainder(field)?;
    Ok(match r {
        0 | 1 => 0,
        _ => 11 - r,
    })
}

pub fn mod11_nfe_verify(field: &str) -> bool {
    verify_with(field, mod11_nfe_check_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod10_known_digits() {
        // First field of a Banco do Brasil linha digitável
        assert_eq!(mod10_check_digit("001900000").unwrap(), 9);
        assert_eq!(mod10_check_digit("23790504").unwrap(), 7);
        assert!(mod10_verify("0019000009"));
        assert!(!mod10_verify("0019000008"));
    }

    #[test]
    fn test_compute_then_verify_round_trips() {
        let bodies = [
            "2379050401",  // 10 digits
            "12345678901", // 11 digits
            "846700000019",
            "00000000000",
            "99999999999",
        ];
        for body in bodies {
            let dv10 = mod10_check_digit(body).unwrap();
            assert!(mod10_verify(&format!("{body}{dv10}")), "mod10 {body}");

            let dv11 = mod11_febraban_check_digit(body).unwrap();
            assert!(mod11_febraban_verify(&format!("{body}{dv11}")), "mod11f {body}");

            let dvn = mod11_nfe_check_digit(body).unwrap();
            assert!(mod11_nfe_verify(&format!("{body}{dvn}")), "mod11n {body}");
        }
    }

    #[test]
    fn test_mod11_variants_disagree_at_remainder_ten() {
        // "5" weighted by 2 sums to 10, so the remainder is 10
        assert_eq!(mod11_febraban_check_digit("5").unwrap(), 0);
        assert_eq!(mod11_nfe_check_digit("5").unwrap(), 1);
        assert!(mod11_febraban_verify("50"));
        assert!(mod11_nfe_verify("51"));
    }

    #[test]
    fn test_non_digit_and_empty_inputs_fail() {
        assert_eq!(mod10_check_digit(""), Err(ChecksumError::InvalidDigitString));
        assert_eq!(
            mod10_check_digit("12a4"),
            Err(ChecksumError::InvalidDigitString)
        );
        assert_eq!(
            mod11_nfe_check_digit("12-4"),
            Err(ChecksumError::InvalidDigitString)
        );
        assert!(!mod10_verify(""));
        assert!(!mod10_verify("12a4"));
        assert!(!mod11_febraban_verify("ábc1"));
    }
}
