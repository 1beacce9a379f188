//! Sale line reconstruction for OCR'd pharmacy sales reports.
//!
//! [`ocr::parse_payload`] validates the OCR service output into a
//! [`Document`]; [`scan_document`] turns it into catalog-checked
//! [`SaleLine`]s.

pub mod barcode;
pub mod cancel;
pub mod catalog;
pub mod confidence;
pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod line;
pub mod number;
pub mod ocr;
pub mod report_type;
pub mod router;
pub mod solver;
pub mod strategy;
pub mod text;

pub use barcode::Barcode;
pub use cancel::{CancelCheck, NeverCancel};
pub use catalog::{Catalog, Product};
pub use config::{AppConfig, ScanConfig};
pub use document::Document;
pub use error::ScanError;
pub use line::{ResolvedLine, SaleLine};
pub use report_type::ReportType;
pub use router::{ScanResult, scan_document};
pub use strategy::StrategyKind;
