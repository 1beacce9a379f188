// src/catalog.rs

use crate::barcode::Barcode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Confidence of a match found only after repairing the check digit.
pub const REPAIRED_MATCH_CONFIDENCE: f64 = 0.92;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub barcode: Barcode,
    pub name: String,
    #[serde(default)]
    pub cost: Option<f64>,
}

/// A catalog hit.
#[derive(Debug, Clone, Copy)]
pub struct CatalogMatch<'a> {
    pub product: &'a Product,
    pub confidence: f64,
}

/// Immutable product snapshot a scan resolves barcodes against.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<Barcode, Product>,
}

impl Catalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|p| (p.barcode.clone(), p))
                .collect(),
        }
    }

    /// Parse a JSON array of `{"barcode", "name", "cost"}` records.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let products: Vec<Product> = serde_json::from_slice(bytes)?;
        Ok(Self::new(products))
    }

    /// Look a barcode up, retrying with a repaired check digit on a miss.
    pub fn resolve(&self, barcode: &Barcode) -> Option<CatalogMatch<'_>> {
        if let Some(product) = self.products.get(barcode) {
            return Some(CatalogMatch {
                product,
                confidence: 1.0,
            });
        }
        self.products
            .get(&barcode.with_fixed_check_digit())
            .map(|product| CatalogMatch {
                product,
                confidence: REPAIRED_MATCH_CONFIDENCE,
            })
    }

    pub fn contains(&self, barcode: &Barcode) -> bool {
        self.resolve(barcode).is_some()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            br#"[
                {"barcode": "3001234567892", "name": "PAROL 500MG 20 TB", "cost": 12.4},
                {"barcode": "3009876543210", "name": "MAJEZIK 100MG"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_exact_match() {
        let c = catalog();
        let hit = c.resolve(&Barcode::parse("3009876543210").unwrap()).unwrap();
        assert_eq!(hit.product.name, "MAJEZIK 100MG");
        assert_eq!(hit.confidence, 1.0);
        assert_eq!(hit.product.cost, None);
    }

    #[test]
    fn test_check_digit_repair() {
        let c = catalog();
        // last digit misread; 300123456789 has check digit 2
        let hit = c.resolve(&Barcode::parse("3001234567890").unwrap()).unwrap();
        assert_eq!(hit.product.name, "PAROL 500MG 20 TB");
        assert_eq!(hit.confidence, REPAIRED_MATCH_CONFIDENCE);
    }

    #[test]
    fn test_miss() {
        let c = catalog();
        assert!(c.resolve(&Barcode::parse("3005555555555").unwrap()).is_none());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_invalid_barcode_rejected_on_import() {
        assert!(Catalog::from_json(br#"[{"barcode": "869123", "name": "X"}]"#).is_err());
    }
}
