// src/strategy/geometry.rs

use super::{ParseContext, ParseStrategy, StrategyKind};
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::layout::header::HeaderField;
use crate::layout::noise::NoiseBlacklist;
use crate::layout::rows::{Row, reconstruct_rows};
use crate::layout::skew::{deskew, estimate_skew};
use crate::layout::zones::ZoneMap;
use crate::line::ResolvedLine;
use crate::solver::{NumericPool, solve};
use tracing::{debug, info};

/// Rebuilds the table from token positions: deskew, barcode-anchored rows,
/// header zones and the arithmetic solver.
pub struct GeometryReconstruction;

impl ParseStrategy for GeometryReconstruction {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GeometryReconstruction
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Result<Vec<ResolvedLine>> {
        let cfg = ctx.config;
        let mut pages: Vec<(ZoneMap, Vec<Row>)> = Vec::with_capacity(ctx.document.pages.len());

        for page in &ctx.document.pages {
            if ctx.cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if page.tokens.is_empty() {
                continue;
            }
            let angle = estimate_skew(&page.tokens, &cfg.geometry);
            let tokens = deskew(&page.tokens, angle);
            let zones = ZoneMap::for_page(&tokens, cfg.geometry.row_band, &cfg.zones);
            let rows = reconstruct_rows(tokens, &cfg.geometry);
            info!(
                page = page.index,
                skew_degrees = angle.to_degrees(),
                rows = rows.len(),
                header_zones = zones.from_headers_found(),
                "Reconstructed page"
            );
            pages.push((zones, rows));
        }

        // Repeating values are counted over the whole document.
        let blacklist = NoiseBlacklist::build(pages.iter().flat_map(|(_, rows)| rows), &cfg.noise);

        let mut lines = Vec::new();
        for (zones, rows) in &pages {
            lines.extend(rows.iter().filter_map(|row| read_row(row, zones, &blacklist, cfg)));
        }
        Ok(lines)
    }
}

fn read_row(
    row: &Row,
    zones: &ZoneMap,
    blacklist: &NoiseBlacklist,
    cfg: &ScanConfig,
) -> Option<ResolvedLine> {
    let barcode = row.anchor()?.clone();
    let values = zones.extract(row, cfg.strategy.exact_quantity_max, blacklist);

    let mut pool = NumericPool::new();
    for token in row.tokens() {
        let Some(value) = token.value() else {
            continue;
        };
        if token.barcode().is_some() || blacklist.contains(value) {
            continue;
        }
        // Product-name area left of every zone.
        let Some(field) = zones.field_at(token.x_center()) else {
            continue;
        };
        if zones.admits_to_pool(token) {
            pool.push_text(token.text(), &cfg.solver);
        } else if field == HeaderField::Quantity {
            if let Some(q) = token.integer().filter(|q| *q > 0 && *q <= cfg.solver.max_quantity) {
                pool.push_candidate(q as i32);
            }
        }
    }

    let solved = solve(&pool, values.quantity, &cfg.solver);
    let mut line = ResolvedLine::new(barcode, solved.quantity);
    line.unit_price = solved.unit_price.or(values.unit_price);
    line.total = solved.total.or(values.total);
    line.cost = solved.cost.or(values.cost);
    line.profit = solved.profit.or(values.profit);
    line.stock = values.stock;
    line.complete_prices();
    debug!(
        barcode = %line.barcode,
        quantity = line.quantity,
        total = ?line.total,
        method = ?solved.method,
        "Geometry row"
    );
    Some(line)
}
