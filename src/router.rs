// src/router.rs

//! Runs the strategies in priority order and turns the first useful result
//! into catalog-checked sale lines.

use crate::cancel::CancelCheck;
use crate::catalog::Catalog;
use crate::confidence;
use crate::config::ScanConfig;
use crate::document::Document;
use crate::error::{Result, ScanError};
use crate::line::{ResolvedLine, SaleLine};
use crate::report_type::{self, ReportType};
use crate::strategy::{ParseContext, ParseStrategy, StrategyKind, default_chain};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub report_type: ReportType,
    /// `None` when no strategy produced a single catalog product.
    pub strategy: Option<StrategyKind>,
    pub lines: Vec<SaleLine>,
}

impl ScanResult {
    fn empty(report_type: ReportType) -> Self {
        Self {
            report_type,
            strategy: None,
            lines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Scan one document.
///
/// Errors only on cancellation; an unreadable document gives an empty result.
pub fn scan_document(
    document: &Document,
    catalog: &Catalog,
    config: &ScanConfig,
    cancel: &dyn CancelCheck,
) -> Result<ScanResult> {
    scan_with(&default_chain(), document, catalog, config, cancel)
}

/// [`scan_document`] over a custom strategy chain.
pub fn scan_with(
    chain: &[Box<dyn ParseStrategy>],
    document: &Document,
    catalog: &Catalog,
    config: &ScanConfig,
    cancel: &dyn CancelCheck,
) -> Result<ScanResult> {
    let span = info_span!(
        "scan_document",
        pages = document.pages.len(),
        tokens = document.token_count(),
        entities = document.entities.len()
    );
    let _enter = span.enter();

    if document.is_empty() {
        info!("Empty document");
        return Ok(ScanResult::empty(ReportType::Unknown));
    }

    let lines = document.text_lines(config.geometry.row_band);
    let report_type = report_type::classify(&lines);
    info!(report_type = %report_type, lines = lines.len(), "Classified report");

    let ctx = ParseContext {
        document,
        lines: &lines,
        config,
        cancel,
    };

    for strategy in chain {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        let kind = strategy.kind();
        let strategy_span = info_span!("strategy", kind = %kind);
        let _enter = strategy_span.enter();

        let candidates = strategy.parse(&ctx)?;
        let found = candidates.len();
        let mut sale_lines = resolve_in_catalog(candidates, catalog);
        if sale_lines.is_empty() {
            debug!(candidates = found, "No catalog product, trying next strategy");
            continue;
        }

        if report_type == ReportType::Receipt {
            sale_lines = merge_repeated(sale_lines);
        }
        for sale in &mut sale_lines {
            sale.line.confidence = confidence::score(&sale.line, kind, &config.confidence);
        }

        info!(
            candidates = found,
            items = sale_lines.len(),
            "Strategy accepted"
        );
        return Ok(ScanResult {
            report_type,
            strategy: Some(kind),
            lines: sale_lines,
        });
    }

    warn!("No items recognized, please rescan");
    Ok(ScanResult::empty(report_type))
}

fn resolve_in_catalog(candidates: Vec<ResolvedLine>, catalog: &Catalog) -> Vec<SaleLine> {
    candidates
        .into_iter()
        .filter_map(|line| match catalog.resolve(&line.barcode) {
            Some(hit) => Some(SaleLine::new(line, hit)),
            None => {
                debug!(barcode = %line.barcode, "Not in catalog, dropping line");
                None
            }
        })
        .collect()
}

/// A till receipt prints one line per scanned unit; fold them per product,
/// keeping first-seen order.
fn merge_repeated(lines: Vec<SaleLine>) -> Vec<SaleLine> {
    let mut merged: Vec<SaleLine> = Vec::with_capacity(lines.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for sale in lines {
        match index.get(sale.line.barcode.as_str()) {
            Some(&i) => merged[i].line.merge(&sale.line),
            None => {
                index.insert(sale.line.barcode.to_string(), merged.len());
                merged.push(sale);
            }
        }
    }
    merged
}
