// src/report_type.rs

use crate::text::fold;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Report families the pharmacy software prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Per-product sales with cost and pharmacist profit.
    ProductDetail,
    /// Per-product net sales with tax and balance.
    ProductSummary,
    /// Till receipt, one line per scanned unit.
    Receipt,
    Unknown,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::ProductDetail => "product_detail",
            ReportType::ProductSummary => "product_summary",
            ReportType::Receipt => "receipt",
            ReportType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword features of a report's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub profit: bool,
    pub cost: bool,
    pub net_sales: bool,
    pub tax: bool,
    pub sales_amount: bool,
    pub balance: bool,
    pub receipt: bool,
    pub register: bool,
    pub title: bool,
    pub column_header: bool,
    pub total_row: bool,
}

impl Features {
    pub fn extract(lines: &[String]) -> Self {
        let folded = fold(&lines.join(" "));
        let text = format!(" {folded} ");
        let has = |marker: &str| text.contains(&format!(" {marker} "));

        let net_sales = has("net satis");
        let tax = has("kdv");
        Self {
            profit: has("ecz kar"),
            cost: has("maliyet") || has("maliyeti"),
            net_sales,
            tax,
            sales_amount: has("satis tutari"),
            balance: has("bakiye"),
            receipt: has("fis") || has("fisi"),
            register: has("kasa"),
            title: has("urun bazinda satis raporu"),
            column_header: (has("miktar") || has("miktari")) && net_sales && tax,
            total_row: has("toplam"),
        }
    }

    fn any(&self) -> bool {
        self.profit
            || self.cost
            || self.net_sales
            || self.tax
            || self.sales_amount
            || self.balance
            || self.receipt
            || self.register
            || self.title
            || self.column_header
            || self.total_row
    }
}

/// Classify a report from its text lines.
pub fn classify(lines: &[String]) -> ReportType {
    classify_features(&Features::extract(lines))
}

pub fn classify_features(f: &Features) -> ReportType {
    if f.title {
        return ReportType::ProductDetail;
    }
    if !f.any() {
        return ReportType::Unknown;
    }

    let weight = |on: bool, w: u32| if on { w } else { 0 };
    // Highest first; equal scores keep the earlier entry.
    let scores = [
        (
            ReportType::ProductDetail,
            weight(f.profit, 2) + weight(f.cost, 2) + weight(f.sales_amount, 1),
        ),
        (
            ReportType::ProductSummary,
            weight(f.net_sales, 2) + weight(f.tax, 1) + weight(f.balance, 1),
        ),
        (
            ReportType::Receipt,
            weight(f.receipt, 2) + weight(f.register, 1),
        ),
    ];
    debug!(?scores, "Report type scores");

    let mut best = (ReportType::Unknown, 0);
    for (kind, score) in scores {
        if score > best.1 {
            best = (kind, score);
        }
    }
    best.0
}
