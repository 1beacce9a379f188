// src/strategy/columnar.rs

use super::{ParseContext, ParseStrategy, StrategyKind};
use crate::barcode::Barcode;
use crate::error::Result;
use crate::line::ResolvedLine;
use crate::number::{BARCODE_LIKE_MIN, parse_number};
use tracing::debug;

/// Last resort for OCR that read the table column by column: all barcodes
/// first, then all line totals, each in printed order.
pub struct ColumnarBlock;

impl ParseStrategy for ColumnarBlock {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ColumnarBlock
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Result<Vec<ResolvedLine>> {
        Ok(read_columns(ctx.lines, ctx.config.strategy.columnar_min_value))
    }
}

fn read_columns(lines: &[String], min_value: f64) -> Vec<ResolvedLine> {
    let barcodes: Vec<Barcode> = lines.iter().filter_map(|l| Barcode::find_in_line(l)).collect();
    let totals: Vec<f64> = lines
        .iter()
        .filter_map(|l| parse_number(l))
        .filter(|v| *v > min_value && *v < BARCODE_LIKE_MIN)
        .collect();

    if barcodes.len() != totals.len() {
        debug!(
            barcodes = barcodes.len(),
            totals = totals.len(),
            "Column lengths differ, pairing in order"
        );
    }

    barcodes
        .into_iter()
        .zip(totals)
        .map(|(barcode, total)| {
            let mut line = ResolvedLine::new(barcode, 1);
            line.unit_price = Some(total);
            line.total = Some(total);
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zips_barcodes_with_standalone_totals() {
        let lines: Vec<String> = [
            "3001234567890",
            "3009876543210",
            "PAROL 500MG",
            "12",
            "145,50",
            "1.230,00",
            "TOPLAM 1.375,50",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let out = read_columns(&lines, 100.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].barcode.as_str(), "3001234567890");
        assert_eq!(out[0].total, Some(145.5));
        assert_eq!(out[1].total, Some(1230.0));
        assert_eq!(out[1].quantity, 1);
    }
}
