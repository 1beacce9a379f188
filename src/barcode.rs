// src/barcode.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// EAN-13 codes of the pharma range, as they appear inside free text.
static BARCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b3\d{12}\b").expect("static barcode pattern"));

/// A product barcode: exactly 13 ASCII digits starting with `3`.
///
/// The prefix check is what keeps long price-looking integers from being
/// taken as row anchors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Barcode(String);

impl Barcode {
    /// Accept `text` only if it already is a valid barcode.
    pub fn parse(text: &str) -> Option<Self> {
        let t = text.trim();
        if t.len() == 13 && t.starts_with('3') && t.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(t.to_string()))
        } else {
            None
        }
    }

    /// Recover a barcode from a noisy OCR rendering.
    ///
    /// Keeps only digits; OCR sometimes glues a date or receipt number in
    /// front, so longer runs keep their last 13 digits.
    pub fn normalize(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 13 {
            return None;
        }
        Self::parse(&digits[digits.len() - 13..])
    }

    /// First barcode embedded in a line of text.
    pub fn find_in_line(line: &str) -> Option<Self> {
        BARCODE_RE
            .find(line)
            .and_then(|m| Self::parse(m.as_str()))
    }

    /// The same code with its EAN-13 check digit recomputed.
    ///
    /// OCR misreads the last digit often enough that catalog lookups retry
    /// with the repaired code.
    pub fn with_fixed_check_digit(&self) -> Self {
        let first12 = &self.0[..12];
        Self(format!("{first12}{}", ean13_check_digit(first12)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// EAN-13 check digit of the first twelve digits.
fn ean13_check_digit(first12: &str) -> u32 {
    let sum: u32 = first12
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 0 { d } else { 3 * d }
        })
        .sum();
    (10 - sum % 10) % 10
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Barcode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid barcode '{value}'"))
    }
}

impl From<Barcode> for String {
    fn from(value: Barcode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_barcode() {
        let bc = Barcode::parse("3001234567890").unwrap();
        assert_eq!(bc.as_str(), "3001234567890");
    }

    #[test]
    fn test_rejects_wrong_prefix_or_length() {
        assert!(Barcode::parse("8691234567890").is_none());
        assert!(Barcode::parse("300123456789").is_none());
        assert!(Barcode::parse("30012345678901").is_none());
        assert!(Barcode::parse("300123456789X").is_none());
        assert!(Barcode::parse("1234,56").is_none());
    }

    #[test]
    fn test_normalize_strips_noise() {
        assert_eq!(
            Barcode::normalize("*3001234567890.").map(|b| b.to_string()),
            Some("3001234567890".to_string())
        );
        // receipt number glued in front
        assert_eq!(
            Barcode::normalize("20253001234567890").map(|b| b.to_string()),
            Some("3001234567890".to_string())
        );
        assert!(Barcode::normalize("0001234567890").is_none());
    }

    #[test]
    fn test_find_in_line() {
        let bc = Barcode::find_in_line("3001234567890 PAROL 500MG 2 15,00").unwrap();
        assert_eq!(bc.as_str(), "3001234567890");
        assert!(Barcode::find_in_line("TOPLAM 1.234,56").is_none());
        assert!(Barcode::find_in_line("83001234567890").is_none());
    }

    #[test]
    fn test_check_digit_repair() {
        // digit sum is 3, so the check digit is (10 - 3) % 10
        let bc = Barcode::parse("3000000000001").unwrap();
        assert_eq!(bc.with_fixed_check_digit().as_str(), "3000000000007");
    }
}
