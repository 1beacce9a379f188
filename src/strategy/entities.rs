// src/strategy/entities.rs

use super::{ParseContext, ParseStrategy, StrategyKind};
use crate::barcode::Barcode;
use crate::document::EntityGroup;
use crate::error::Result;
use crate::line::ResolvedLine;
use crate::number::parse_number;
use tracing::debug;

const LINE_ITEM_KINDS: &[&str] = &["items", "line_item"];

/// Line items labelled by a custom extraction model.
pub struct StructuredEntities;

impl ParseStrategy for StructuredEntities {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StructuredEntities
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Result<Vec<ResolvedLine>> {
        Ok(ctx
            .document
            .entities
            .iter()
            .filter(|g| LINE_ITEM_KINDS.iter().any(|k| g.kind.eq_ignore_ascii_case(k)))
            .filter_map(read_group)
            .collect())
    }
}

fn read_group(group: &EntityGroup) -> Option<ResolvedLine> {
    let Some(barcode) = group.property(&["barcode"]).and_then(Barcode::normalize) else {
        debug!(mention = %group.mention_text, "Entity without a valid barcode, skipping");
        return None;
    };
    let number = |names: &[&str]| group.property(names).and_then(parse_number);

    let quantity = number(&["quantity"])
        .map(|q| q.round())
        .filter(|q| *q >= 1.0 && *q <= f64::from(i32::MAX))
        .map_or(1, |q| q as i32);

    let mut line = ResolvedLine::new(barcode, quantity);
    line.unit_price = number(&["unit_price"]);
    line.total = number(&["net_sales", "gross_sales", "total"]);
    line.cost = number(&["cost", "maliyet"]);
    line.profit = number(&["pharmacist_profit", "profit", "ecz_kar"]);
    line.stock = number(&["remaining_stock", "stock"])
        .filter(|s| s.fract() == 0.0 && s.abs() <= f64::from(i32::MAX))
        .map(|s| s as i32);
    line.complete_prices();
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::NeverCancel;
    use crate::config::ScanConfig;
    use crate::document::{Document, EntityProperty};

    fn group(kind: &str, props: &[(&str, &str)]) -> EntityGroup {
        EntityGroup {
            kind: kind.into(),
            mention_text: String::new(),
            confidence: Some(0.9),
            properties: props
                .iter()
                .map(|(k, v)| EntityProperty {
                    kind: k.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    fn run(entities: Vec<EntityGroup>) -> Vec<ResolvedLine> {
        let document = Document {
            pages: vec![],
            entities,
        };
        let config = ScanConfig::default();
        let ctx = ParseContext {
            document: &document,
            lines: &[],
            config: &config,
            cancel: &NeverCancel,
        };
        StructuredEntities.parse(&ctx).unwrap()
    }

    #[test]
    fn test_reads_item_groups() {
        let lines = run(vec![
            group(
                "items",
                &[
                    ("barcode", "3001234567890"),
                    ("quantity", "2"),
                    ("net_sales", "30,00"),
                    ("maliyet", "21,00"),
                    ("ecz_kar", "9,00"),
                    ("remaining_stock", "14"),
                ],
            ),
            group("supplier", &[("barcode", "3009876543210")]),
        ]);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.quantity, 2);
        assert_eq!(line.total, Some(30.0));
        assert_eq!(line.unit_price, Some(15.0));
        assert_eq!(line.cost, Some(21.0));
        assert_eq!(line.profit, Some(9.0));
        assert_eq!(line.stock, Some(14));
    }

    #[test]
    fn test_skips_invalid_barcode_and_defaults_quantity() {
        let lines = run(vec![
            group("line_item", &[("barcode", "8691234567890"), ("total", "5")]),
            group("LINE_ITEM", &[("barcode", "3001234567890"), ("total", "5,50")]),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[0].unit_price, Some(5.5));
    }
}
