// src/text.rs

/// Fold report text for keyword matching: lowercase, Turkish letters mapped to
/// ASCII, punctuation turned into single spaces.
///
/// `"Ürün Bazında Satış Raporu"` and `"URUN BAZINDA SATIS RAPORU"` both fold
/// to `"urun bazinda satis raporu"`; `"Ecz.Kar"` folds to `"ecz kar"`.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        let mapped = match c {
            'ı' | 'İ' | 'I' | 'i' => Some('i'),
            'ş' | 'Ş' => Some('s'),
            'ğ' | 'Ğ' => Some('g'),
            'ü' | 'Ü' => Some('u'),
            'ö' | 'Ö' => Some('o'),
            'ç' | 'Ç' => Some('c'),
            c if c.is_alphanumeric() => c.to_lowercase().next(),
            _ => None,
        };
        match mapped {
            Some(m) => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(m);
            }
            None => pending_space = true,
        }
    }
    out
}

/// Footer lines close the item list: `TOPLAM`, `GENEL TOPLAM`, `TOPLAMI`,
/// `TOTAL` at the start of the line. A title like `SATIŞ TOPLAMLARI` is not
/// a footer.
pub fn is_footer_line(line: &str) -> bool {
    let folded = fold(line);
    ["toplam", "genel toplam", "total"]
        .iter()
        .any(|marker| starts_with_word(&folded, marker))
}

fn starts_with_word(folded: &str, marker: &str) -> bool {
    match folded.strip_prefix(marker) {
        Some(rest) => {
            rest.is_empty() || rest.starts_with(' ') || rest == "i" || rest.starts_with("i ")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_turkish() {
        assert_eq!(fold("Ürün Bazında Satış Raporu"), "urun bazinda satis raporu");
        assert_eq!(fold("ÜRÜN BAZINDA SATIŞ RAPORU"), "urun bazinda satis raporu");
        assert_eq!(fold("Ecz.Kar"), "ecz kar");
        assert_eq!(fold("  Sat.Ad  "), "sat ad");
    }

    #[test]
    fn test_footer_lines() {
        assert!(is_footer_line("TOPLAM 1.234,56"));
        assert!(is_footer_line("Genel Toplam: 5.000,00"));
        assert!(is_footer_line("TOPLAMI 12"));
        assert!(is_footer_line("TOTAL"));
        assert!(!is_footer_line("SATIŞ TOPLAMLARI"));
        assert!(!is_footer_line("TOPLAMLARI"));
        assert!(!is_footer_line("3001234567890 PAROL"));
    }
}
