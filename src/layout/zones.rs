// src/layout/zones.rs

//! Column zones: one X band per header field.

use super::header::{Field, Header, HeaderField, detect_headers};
use super::noise::NoiseBlacklist;
use super::rows::Row;
use crate::config::ZoneConfig;
use crate::document::Token;
use tracing::debug;

/// Half-open band `[x_start, x_end)` on the page; the right-most zone also
/// owns `x = 1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnZone {
    pub field: HeaderField,
    pub x_start: f64,
    pub x_end: f64,
}

/// Disjoint column zones of one page.
#[derive(Debug, Clone)]
pub struct ZoneMap {
    zones: Vec<ColumnZone>,
    from_headers: bool,
}

/// Values a row yields by column position alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneValues {
    pub quantity: Option<i32>,
    pub stock: Option<i32>,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
    pub cost: Option<f64>,
    pub profit: Option<f64>,
}

impl ZoneMap {
    /// Zones for a (deskewed) page: from its header line when one is found,
    /// otherwise the default layout of the report family.
    pub fn for_page(tokens: &[Token], band: f64, cfg: &ZoneConfig) -> Self {
        let headers = detect_headers(tokens, band, cfg.header_merge_gap);
        match Self::from_headers(headers, cfg) {
            Some(map) => map,
            None => {
                debug!("No column headers, using default zone layout");
                Self::default_layout(cfg)
            }
        }
    }

    /// Build zones from detected headers; `None` when there are none.
    pub fn from_headers(mut headers: Vec<Header>, cfg: &ZoneConfig) -> Option<Self> {
        if headers.is_empty() {
            return None;
        }
        headers.sort_by(|a, b| a.x_center.total_cmp(&b.x_center));
        synthesize_price(&mut headers, cfg);

        let n = headers.len();
        let mut zones = Vec::with_capacity(n);
        for i in 0..n {
            let x = headers[i].x_center;
            let x_start = if i == 0 {
                let half = if n > 1 {
                    (headers[1].x_center - x) / 2.0
                } else {
                    cfg.single_header_half_width
                };
                // Leave the product-name area to the left alone, unless the
                // header itself already starts there.
                (x - half).max(cfg.first_zone_floor).min(headers[0].x_min).max(0.0)
            } else {
                (headers[i - 1].x_center + x) / 2.0
            };
            let x_end = if i + 1 == n {
                1.0
            } else {
                (x + headers[i + 1].x_center) / 2.0
            };
            zones.push(ColumnZone {
                field: headers[i].field,
                x_start,
                x_end,
            });
        }

        debug!(
            zones = ?zones.iter().map(|z| (z.field, z.x_start, z.x_end)).collect::<Vec<_>>(),
            "Column zones from headers"
        );
        Some(Self {
            zones,
            from_headers: true,
        })
    }

    pub fn default_layout(cfg: &ZoneConfig) -> Self {
        let mut zones: Vec<ColumnZone> = cfg
            .default_bands
            .iter()
            .map(|b| ColumnZone {
                field: b.field,
                x_start: b.start,
                x_end: b.end,
            })
            .collect();
        zones.sort_by(|a, b| a.x_start.total_cmp(&b.x_start));
        Self {
            zones,
            from_headers: false,
        }
    }

    pub fn zones(&self) -> &[ColumnZone] {
        &self.zones
    }

    pub fn from_headers_found(&self) -> bool {
        self.from_headers
    }

    /// The zone containing `x`, if any.
    pub fn field_at(&self, x: f64) -> Option<HeaderField> {
        let last = self.zones.len().checked_sub(1)?;
        self.zones
            .iter()
            .enumerate()
            .find(|(i, z)| x >= z.x_start && (x < z.x_end || (*i == last && x <= z.x_end)))
            .map(|(_, z)| z.field)
    }

    /// Whether a numeric token may enter the solver pool.
    ///
    /// Quantity, stock and tax columns are not prices. The default layout is
    /// only a guess, so there it excludes plain integers alone.
    pub fn admits_to_pool(&self, token: &Token) -> bool {
        match self.field_at(token.x_center()) {
            Some(HeaderField::Quantity | HeaderField::Stock | HeaderField::Tax) => {
                !self.from_headers && token.integer().is_none()
            }
            _ => true,
        }
    }

    /// Read a row by column position.
    ///
    /// The first value per field wins, except that a net-total column takes
    /// precedence over a plain total. Blacklisted values are skipped.
    pub fn extract(
        &self,
        row: &Row,
        max_quantity: i32,
        blacklist: &NoiseBlacklist,
    ) -> ZoneValues {
        let mut out = ZoneValues::default();
        let mut net_total = None;

        for token in row.tokens() {
            if token.barcode().is_some() {
                continue;
            }
            let Some(value) = token.value() else {
                continue;
            };
            if blacklist.contains(value) {
                continue;
            }
            let Some(header) = self.field_at(token.x_center()) else {
                continue;
            };
            if header == HeaderField::NetTotal {
                net_total = net_total.or(Some(value));
                continue;
            }
            match header.canonical() {
                Some(Field::Quantity) => {
                    if out.quantity.is_none() {
                        out.quantity = token
                            .integer()
                            .filter(|q| *q > 0 && *q < i64::from(max_quantity))
                            .map(|q| q as i32);
                    }
                }
                Some(Field::Stock) => {
                    if out.stock.is_none() {
                        out.stock = token.integer().and_then(|s| i32::try_from(s).ok());
                    }
                }
                Some(Field::UnitPrice) => out.unit_price = out.unit_price.or(Some(value)),
                Some(Field::Total) => out.total = out.total.or(Some(value)),
                Some(Field::Cost) => out.cost = out.cost.or(Some(value)),
                Some(Field::Profit) => out.profit = out.profit.or(Some(value)),
                None => {}
            }
        }
        if net_total.is_some() {
            out.total = net_total;
        }
        out
    }
}

/// No price header but a stock header: the report family prints the unit
/// price immediately left of stock, so place a virtual price header there.
fn synthesize_price(headers: &mut Vec<Header>, cfg: &ZoneConfig) {
    if headers.iter().any(|h| h.field == HeaderField::UnitPrice) {
        return;
    }
    let Some(stock_idx) = headers.iter().position(|h| h.field == HeaderField::Stock) else {
        return;
    };

    let spacing = if headers.len() >= 2 {
        (headers[headers.len() - 1].x_center - headers[0].x_center) / (headers.len() - 1) as f64
    } else {
        cfg.virtual_header_spacing
    };
    let stock = &headers[stock_idx];
    let mut x = stock.x_center - spacing;
    if stock_idx > 0 {
        x = x.max((headers[stock_idx - 1].x_center + stock.x_center) / 2.0);
    }
    let x = x.max(0.0);
    let half = stock.x_max - stock.x_center;

    debug!(x, "Synthesized price header left of stock");
    let virtual_price = Header {
        field: HeaderField::UnitPrice,
        x_center: x,
        x_min: x - half,
        x_max: x + half,
        y_center: stock.y_center,
    };
    headers.insert(stock_idx, virtual_price);
}
