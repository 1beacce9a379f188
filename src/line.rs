// src/line.rs

use crate::barcode::Barcode;
use crate::catalog::CatalogMatch;
use crate::number::round_cents;
use serde::Serialize;

/// One sale line as a strategy read it, before the catalog check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLine {
    pub barcode: Barcode,
    pub quantity: i32,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
    pub cost: Option<f64>,
    pub profit: Option<f64>,
    pub stock: Option<i32>,
    /// Match confidence; folded into the final score by the router.
    pub confidence: f64,
}

impl ResolvedLine {
    pub fn new(barcode: Barcode, quantity: i32) -> Self {
        Self {
            barcode,
            quantity: quantity.max(1),
            unit_price: None,
            total: None,
            cost: None,
            profit: None,
            stock: None,
            confidence: 1.0,
        }
    }

    /// Total, cost and profit all known.
    pub fn is_complete(&self) -> bool {
        self.total.is_some() && self.cost.is_some() && self.profit.is_some()
    }

    /// Fold another reading of the same product into this one.
    pub fn merge(&mut self, other: &ResolvedLine) {
        self.quantity += other.quantity;
        self.total = match (self.total, other.total) {
            (Some(a), Some(b)) => Some(round_cents(a + b)),
            (a, b) => a.or(b),
        };
        self.unit_price = self.unit_price.or(other.unit_price);
        self.cost = self.cost.or(other.cost);
        self.profit = self.profit.or(other.profit);
        self.stock = self.stock.or(other.stock);
        self.confidence = self.confidence.min(other.confidence);
    }

    /// Derive a missing unit price or total from the other and the quantity.
    pub fn complete_prices(&mut self) {
        let q = f64::from(self.quantity.max(1));
        match (self.unit_price, self.total) {
            (None, Some(t)) => self.unit_price = Some(round_cents(t / q)),
            (Some(p), None) => self.total = Some(round_cents(p * q)),
            _ => {}
        }
    }
}

/// A line whose barcode is in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleLine {
    #[serde(flatten)]
    pub line: ResolvedLine,
    pub product_name: String,
    pub catalog_cost: Option<f64>,
}

impl SaleLine {
    /// Attach the catalog product; the barcode becomes the catalog's own, so
    /// a check-digit repair shows in the output.
    pub fn new(mut line: ResolvedLine, hit: CatalogMatch<'_>) -> Self {
        line.barcode = hit.product.barcode.clone();
        line.confidence *= hit.confidence;
        Self {
            line,
            product_name: hit.product.name.clone(),
            catalog_cost: hit.product.cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sums_quantity_and_total() {
        let bc = Barcode::parse("3001234567890").unwrap();
        let mut a = ResolvedLine::new(bc.clone(), 1);
        a.total = Some(12.5);
        a.unit_price = Some(12.5);
        let mut b = ResolvedLine::new(bc, 2);
        b.total = Some(25.0);
        a.merge(&b);
        assert_eq!(a.quantity, 3);
        assert_eq!(a.total, Some(37.5));
        assert_eq!(a.unit_price, Some(12.5));
    }

    #[test]
    fn test_quantity_at_least_one() {
        let line = ResolvedLine::new(Barcode::parse("3001234567890").unwrap(), 0);
        assert_eq!(line.quantity, 1);
        assert!(!line.is_complete());
    }

    #[test]
    fn test_complete_prices() {
        let mut line = ResolvedLine::new(Barcode::parse("3001234567890").unwrap(), 4);
        line.total = Some(50.0);
        line.complete_prices();
        assert_eq!(line.unit_price, Some(12.5));
    }
}
