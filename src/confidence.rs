// src/confidence.rs

use crate::config::ConfidenceConfig;
use crate::line::ResolvedLine;
use crate::strategy::StrategyKind;

/// Trust in a strategy's output before looking at the individual line.
pub fn base(kind: StrategyKind, cfg: &ConfidenceConfig) -> f64 {
    match kind {
        StrategyKind::StructuredEntities => cfg.entities,
        StrategyKind::GridTable => cfg.grid,
        StrategyKind::GeometryReconstruction => cfg.geometry,
        StrategyKind::SequentialLineHeuristic => cfg.sequential,
        StrategyKind::ColumnarBlock => cfg.columnar,
    }
}

/// Lines carrying the full financial breakdown are more likely to be read
/// right.
pub fn completeness_bonus(line: &ResolvedLine, cfg: &ConfidenceConfig) -> f64 {
    if line.is_complete() {
        cfg.full_bonus
    } else if line.total.is_some() {
        cfg.total_bonus
    } else {
        1.0
    }
}

/// `match × base × bonus`, clamped to `[0, 1]` and rounded to three decimals.
pub fn score(line: &ResolvedLine, kind: StrategyKind, cfg: &ConfidenceConfig) -> f64 {
    let raw = line.confidence * base(kind, cfg) * completeness_bonus(line, cfg);
    (raw.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::Barcode;

    fn line() -> ResolvedLine {
        ResolvedLine::new(Barcode::parse("3001234567890").unwrap(), 1)
    }

    #[test]
    fn test_complete_line_is_capped() {
        let cfg = ConfidenceConfig::default();
        let mut l = line();
        l.total = Some(120.0);
        l.cost = Some(84.0);
        l.profit = Some(36.0);
        // 0.95 × 1.15 > 1
        assert_eq!(score(&l, StrategyKind::StructuredEntities, &cfg), 1.0);
        assert_eq!(score(&l, StrategyKind::ColumnarBlock, &cfg), 0.69);
    }

    #[test]
    fn test_repaired_match_lowers_score() {
        let cfg = ConfidenceConfig::default();
        let mut l = line();
        l.confidence = 0.92;
        assert_eq!(score(&l, StrategyKind::GridTable, &cfg), 0.828);
    }

    #[test]
    fn test_total_only_bonus() {
        let cfg = ConfidenceConfig::default();
        let mut l = line();
        l.confidence = 0.92;
        l.total = Some(10.0);
        assert_eq!(score(&l, StrategyKind::GeometryReconstruction, &cfg), 0.821);
        l.total = None;
        assert_eq!(score(&l, StrategyKind::SequentialLineHeuristic, &cfg), 0.69);
    }
}
