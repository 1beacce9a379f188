// src/layout/header.rs

//! Column-header vocabulary of the report family.

use crate::document::Token;
use crate::text::fold;
use serde::{Deserialize, Serialize};

/// A named column header as printed on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField {
    #[serde(rename = "qty")]
    Quantity,
    #[serde(rename = "price")]
    UnitPrice,
    Total,
    NetTotal,
    Profit,
    Cost,
    Stock,
    Tax,
}

/// The financial fields a sale line carries. Header aliases collapse onto
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Quantity,
    UnitPrice,
    Total,
    Profit,
    Cost,
    Stock,
}

impl HeaderField {
    /// `NetTotal` reads as `Total`; `Tax` has no field of its own.
    pub fn canonical(self) -> Option<Field> {
        match self {
            HeaderField::Quantity => Some(Field::Quantity),
            HeaderField::UnitPrice => Some(Field::UnitPrice),
            HeaderField::Total | HeaderField::NetTotal => Some(Field::Total),
            HeaderField::Profit => Some(Field::Profit),
            HeaderField::Cost => Some(Field::Cost),
            HeaderField::Stock => Some(Field::Stock),
            HeaderField::Tax => None,
        }
    }

    /// Rank used when words of one header disagree: `Stok Adet` is stock,
    /// `KDV Tutarı` is tax, `Net Tutar` is the net total.
    fn specificity(self) -> u8 {
        match self {
            HeaderField::NetTotal => 8,
            HeaderField::Tax => 7,
            HeaderField::Stock => 6,
            HeaderField::Quantity => 5,
            HeaderField::Profit => 4,
            HeaderField::Cost => 3,
            HeaderField::UnitPrice => 2,
            HeaderField::Total => 1,
        }
    }

    pub fn more_specific(self, other: HeaderField) -> HeaderField {
        if other.specificity() > self.specificity() {
            other
        } else {
            self
        }
    }
}

const WORDS: &[(&str, HeaderField)] = &[
    ("adet", HeaderField::Quantity),
    ("miktar", HeaderField::Quantity),
    ("miktari", HeaderField::Quantity),
    ("satilan", HeaderField::Quantity),
    ("qty", HeaderField::Quantity),
    ("quantity", HeaderField::Quantity),
    ("fiyat", HeaderField::UnitPrice),
    ("fiyati", HeaderField::UnitPrice),
    ("birim", HeaderField::UnitPrice),
    ("psf", HeaderField::UnitPrice),
    ("price", HeaderField::UnitPrice),
    ("tutar", HeaderField::Total),
    ("tutari", HeaderField::Total),
    ("toplam", HeaderField::Total),
    ("total", HeaderField::Total),
    ("amount", HeaderField::Total),
    ("net", HeaderField::NetTotal),
    ("kar", HeaderField::Profit),
    ("kari", HeaderField::Profit),
    ("ecz", HeaderField::Profit),
    ("profit", HeaderField::Profit),
    ("maliyet", HeaderField::Cost),
    ("maliyeti", HeaderField::Cost),
    ("cost", HeaderField::Cost),
    ("stok", HeaderField::Stock),
    ("kalan", HeaderField::Stock),
    ("mevcut", HeaderField::Stock),
    ("stock", HeaderField::Stock),
    ("kdv", HeaderField::Tax),
    ("tax", HeaderField::Tax),
    ("vat", HeaderField::Tax),
];

/// Header words that name non-financial columns. They matter for skew
/// estimation because they sit on the same printed header line.
const IDENTITY_WORDS: &[&str] = &["barkod", "barcode", "urun", "adi", "product", "ilac"];

/// Classify a header phrase such as `"Birim Fiyat"` or `"Sat.Ad"`.
pub fn classify(text: &str) -> Option<HeaderField> {
    let folded = fold(text);
    if folded.is_empty() {
        return None;
    }
    let mut best: Option<HeaderField> = None;
    if folded.contains("sat ad") {
        best = Some(HeaderField::Quantity);
    }
    for word in folded.split(' ') {
        if let Some(&(_, field)) = WORDS.iter().find(|(w, _)| *w == word) {
            best = Some(best.map_or(field, |b| b.more_specific(field)));
        }
    }
    best
}

/// True for any word of the printed header line, financial or not.
pub fn is_header_vocabulary(token: &Token) -> bool {
    if token.value().is_some() {
        return false;
    }
    classify(token.text()).is_some()
        || fold(token.text())
            .split(' ')
            .any(|w| IDENTITY_WORDS.contains(&w))
}

/// A header token with its classified field.
#[derive(Debug, Clone)]
pub struct Header {
    pub field: HeaderField,
    pub x_center: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_center: f64,
}

impl Header {
    pub fn from_token(token: &Token) -> Option<Self> {
        if token.value().is_some() {
            return None;
        }
        classify(token.text()).map(|field| Self {
            field,
            x_center: token.x_center(),
            x_min: token.x_min(),
            x_max: token.x_max(),
            y_center: token.y_center(),
        })
    }

    fn absorb(&mut self, next: &Header) {
        self.field = self.field.more_specific(next.field);
        self.x_min = self.x_min.min(next.x_min);
        self.x_max = self.x_max.max(next.x_max);
        self.x_center = (self.x_min + self.x_max) / 2.0;
    }
}

/// Pick the header line of a page and merge multi-word headers.
///
/// Header words are grouped into vertical bands; the band with the most
/// words is the printed header line, which keeps a footer `TOPLAM` from
/// opening a phantom column. Adjacent words closer than `merge_gap` form one
/// header.
pub fn detect_headers(tokens: &[Token], band: f64, merge_gap: f64) -> Vec<Header> {
    let mut found: Vec<Header> = tokens.iter().filter_map(Header::from_token).collect();
    if found.is_empty() {
        return found;
    }
    found.sort_by(|a, b| a.y_center.total_cmp(&b.y_center));

    let mut best: Vec<Header> = Vec::new();
    let mut current: Vec<Header> = Vec::new();
    for header in found {
        if let Some(first) = current.first() {
            if (header.y_center - first.y_center).abs() >= band {
                if current.len() > best.len() {
                    best = std::mem::take(&mut current);
                } else {
                    current.clear();
                }
            }
        }
        current.push(header);
    }
    if current.len() > best.len() {
        best = current;
    }

    best.sort_by(|a, b| a.x_center.total_cmp(&b.x_center));
    let mut merged: Vec<Header> = Vec::with_capacity(best.len());
    for header in best {
        match merged.last_mut() {
            Some(prev) if header.x_min - prev.x_max < merge_gap => prev.absorb(&header),
            _ => merged.push(header),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_aliases() {
        assert_eq!(classify("Adet"), Some(HeaderField::Quantity));
        assert_eq!(classify("Sat.Ad"), Some(HeaderField::Quantity));
        assert_eq!(classify("Birim Fiyat"), Some(HeaderField::UnitPrice));
        assert_eq!(classify("Satış Tutarı"), Some(HeaderField::Total));
        assert_eq!(classify("Net Satış"), Some(HeaderField::NetTotal));
        assert_eq!(classify("Ecz.Kar"), Some(HeaderField::Profit));
        assert_eq!(classify("Maliyet"), Some(HeaderField::Cost));
        assert_eq!(classify("Stok Adet"), Some(HeaderField::Stock));
        assert_eq!(classify("KDV Tutarı"), Some(HeaderField::Tax));
        assert_eq!(classify("PAROL 500MG"), None);
    }

    #[test]
    fn test_canonical_merges_net_total() {
        assert_eq!(HeaderField::NetTotal.canonical(), Some(Field::Total));
        assert_eq!(HeaderField::Tax.canonical(), None);
    }

    #[test]
    fn test_vocabulary_excludes_numbers() {
        assert!(is_header_vocabulary(&Token::centered("Barkod", 0, 0.1, 0.1, 0.1)));
        assert!(!is_header_vocabulary(&Token::centered("15,00", 0, 0.1, 0.1, 0.1)));
    }

    #[test]
    fn test_detect_headers_prefers_header_line_and_merges_words() {
        let tokens = vec![
            Token::new("Birim", 0, 0.50, 0.55, 0.10),
            Token::new("Fiyat", 0, 0.56, 0.61, 0.10),
            Token::new("Adet", 0, 0.40, 0.45, 0.10),
            Token::new("Tutar", 0, 0.85, 0.92, 0.10),
            Token::new("TOPLAM", 0, 0.10, 0.20, 0.90),
        ];
        let headers = detect_headers(&tokens, 0.012, 0.02);
        let fields: Vec<_> = headers.iter().map(|h| h.field).collect();
        assert_eq!(
            fields,
            vec![HeaderField::Quantity, HeaderField::UnitPrice, HeaderField::Total]
        );
        assert!((headers[1].x_min - 0.50).abs() < 1e-9);
        assert!((headers[1].x_max - 0.61).abs() < 1e-9);
    }
}
