// src/strategy/sequential.rs

use super::{ParseContext, ParseStrategy, StrategyKind};
use crate::barcode::Barcode;
use crate::config::SolverConfig;
use crate::error::Result;
use crate::line::ResolvedLine;
use crate::solver::{NumericPool, solve};
use crate::text::is_footer_line;
use tracing::debug;

/// Reads the text lines top to bottom: each barcode opens a block that
/// collects numbers until the next barcode or the footer.
pub struct SequentialLineHeuristic;

impl ParseStrategy for SequentialLineHeuristic {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SequentialLineHeuristic
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Result<Vec<ResolvedLine>> {
        Ok(read_blocks(ctx.lines, &ctx.config.solver))
    }
}

struct Block {
    barcode: Barcode,
    pool: NumericPool,
}

impl Block {
    fn finish(self, cfg: &SolverConfig) -> ResolvedLine {
        let solved = solve(&self.pool, None, cfg);
        let mut line = ResolvedLine::new(self.barcode, solved.quantity);
        line.unit_price = solved.unit_price;
        line.total = solved.total;
        line.cost = solved.cost;
        line.profit = solved.profit;
        line
    }
}

fn read_blocks(lines: &[String], cfg: &SolverConfig) -> Vec<ResolvedLine> {
    let mut out = Vec::new();
    let mut current: Option<Block> = None;

    for line in lines {
        if is_footer_line(line) {
            debug!(line = %line, "Footer reached");
            break;
        }
        if let Some(barcode) = Barcode::find_in_line(line) {
            if let Some(block) = current.take() {
                out.push(block.finish(cfg));
            }
            let mut pool = NumericPool::new();
            for word in line.split_whitespace() {
                if word != barcode.as_str() {
                    pool.push_text(word, cfg);
                }
            }
            current = Some(Block { barcode, pool });
            continue;
        }
        if let Some(block) = current.as_mut() {
            for word in line.split_whitespace() {
                block.pool.push_text(word, cfg);
            }
        }
    }
    if let Some(block) = current {
        out.push(block.finish(cfg));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_blocks_between_barcodes() {
        let out = read_blocks(
            &lines(&[
                "Barkod Ürün Adı Adet Tutar",
                "3001234567890 PAROL 500MG",
                "2 15,00 30,00",
                "3009876543210 MAJEZIK",
                "84,00 36,00 120,00",
                "GENEL TOPLAM 150,00",
                "3005555555555 5,00",
            ]),
            &SolverConfig::default(),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].quantity, 2);
        assert_eq!(out[0].unit_price, Some(15.0));
        assert_eq!(out[0].total, Some(30.0));
        assert_eq!(out[1].total, Some(120.0));
        assert_eq!(out[1].cost, Some(84.0));
    }

    #[test]
    fn test_numbers_before_first_barcode_are_ignored() {
        let out = read_blocks(
            &lines(&["Tarih 01.02.2024", "999,00", "3001234567890 12,50"]),
            &SolverConfig::default(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].total, Some(12.5));
    }
}
