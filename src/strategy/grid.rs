// src/strategy/grid.rs

use super::{ParseContext, ParseStrategy, StrategyKind};
use crate::barcode::Barcode;
use crate::config::ScanConfig;
use crate::document::GridTable as Table;
use crate::error::Result;
use crate::layout::header::{Field, HeaderField, classify};
use crate::line::ResolvedLine;
use crate::number::{parse_integer, parse_number};
use crate::solver::{NumericPool, solve};
use tracing::debug;

/// Tables the OCR service detected, read through their header row.
pub struct GridTable;

impl ParseStrategy for GridTable {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GridTable
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Result<Vec<ResolvedLine>> {
        let mut lines = Vec::new();
        for page in &ctx.document.pages {
            for table in &page.tables {
                lines.extend(read_table(table, ctx.config));
            }
        }
        Ok(lines)
    }
}

/// Column index → header field for every classified column.
fn column_fields(header_rows: &[Vec<String>]) -> Vec<Option<HeaderField>> {
    let width = header_rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            // Multi-row headers ("Birim" over "Fiyat") read as one phrase.
            let phrase = header_rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            classify(&phrase)
        })
        .collect()
}

fn read_table(table: &Table, cfg: &ScanConfig) -> Vec<ResolvedLine> {
    let mut body: &[Vec<String>] = &table.body_rows;
    let mut columns = column_fields(&table.header_rows);

    if columns.iter().all(Option::is_none) {
        if let Some((first, rest)) = table.body_rows.split_first() {
            let from_body = column_fields(std::slice::from_ref(first));
            if from_body.iter().any(Option::is_some) {
                columns = from_body;
                body = rest;
            }
        }
    }
    debug!(
        columns = ?columns,
        rows = body.len(),
        "Reading grid table"
    );

    body.iter()
        .filter_map(|row| read_row(row, &columns, cfg))
        .collect()
}

fn read_row(
    cells: &[String],
    columns: &[Option<HeaderField>],
    cfg: &ScanConfig,
) -> Option<ResolvedLine> {
    let barcode = cells.iter().find_map(|c| Barcode::normalize(c))?;

    let mut pool = NumericPool::new();
    let mut exact_quantity = None;
    let mut stock = None;
    let (mut unit_price, mut total, mut net_total, mut cost, mut profit) =
        (None, None, None, None, None);

    // Mapped columns are taken as read; only unlabelled cells go to the solver.
    for (col, cell) in cells.iter().enumerate() {
        let cell = cell.trim();
        if Barcode::normalize(cell).is_some() {
            continue;
        }
        let Some(field) = columns.get(col).copied().flatten() else {
            pool.push_text(cell, &cfg.solver);
            continue;
        };
        if field == HeaderField::NetTotal {
            net_total = net_total.or(parse_number(cell));
            continue;
        }
        match field.canonical() {
            Some(Field::Quantity) => {
                let max = i64::from(cfg.strategy.exact_quantity_max);
                let q = parse_integer(cell).filter(|q| *q > 0 && *q < max);
                exact_quantity = exact_quantity.or(q.map(|q| q as i32));
            }
            Some(Field::Stock) => {
                stock = stock.or(parse_integer(cell).and_then(|s| i32::try_from(s).ok()));
            }
            Some(Field::UnitPrice) => unit_price = unit_price.or(parse_number(cell)),
            Some(Field::Total) => total = total.or(parse_number(cell)),
            Some(Field::Cost) => cost = cost.or(parse_number(cell)),
            Some(Field::Profit) => profit = profit.or(parse_number(cell)),
            None => {}
        }
    }

    let solved = solve(&pool, exact_quantity, &cfg.solver);
    let mut line = ResolvedLine::new(barcode, exact_quantity.unwrap_or(solved.quantity));
    line.unit_price = unit_price.or(solved.unit_price);
    line.total = net_total.or(total).or(solved.total);
    line.cost = cost.or(solved.cost);
    line.profit = profit.or(solved.profit);
    line.stock = stock;
    line.complete_prices();
    Some(line)
}
