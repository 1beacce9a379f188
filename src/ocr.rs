// src/ocr.rs

//! Wire model of the OCR service output and its validation into a
//! [`Document`].
//!
//! A payload looks like:
//!
//! ```json
//! {
//!   "pages": [{
//!     "tokens": [{"text": "Adet", "vertices": [{"x": 0.44, "y": 0.11}, ...]}],
//!     "lines": ["Barkod Ürün Adı Adet Tutar"],
//!     "tables": [{"header_rows": [["Barkod", "Adet"]], "body_rows": [["3...", "2"]]}]
//!   }],
//!   "entities": [{"type": "items", "properties": [{"type": "barcode", "mention_text": "3..."}]}]
//! }
//! ```

use crate::document::{Document, EntityGroup, EntityProperty, GridTable, Page, Token};
use crate::error::{Result, ScanError};
use serde::Deserialize;
use tracing::debug;

/// Coordinates may overshoot the page edge by this much before they count as
/// corrupt; the service rounds boxes of edge-touching words outward.
const EDGE_SLACK: f64 = 0.01;

#[derive(Debug, Deserialize)]
pub struct OcrDocument {
    #[serde(default)]
    pub pages: Option<Vec<OcrPage>>,
    #[serde(default)]
    pub entities: Option<Vec<OcrEntity>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OcrPage {
    pub tokens: Vec<OcrToken>,
    pub lines: Vec<String>,
    pub tables: Vec<OcrTable>,
}

#[derive(Debug, Deserialize)]
pub struct OcrToken {
    pub text: String,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OcrTable {
    pub header_rows: Vec<Vec<String>>,
    pub body_rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct OcrEntity {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub mention_text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub properties: Vec<OcrEntity>,
    #[serde(default)]
    pub normalized_value: Option<String>,
}

/// Parse and validate a JSON payload.
pub fn parse_payload(bytes: &[u8]) -> Result<Document> {
    let raw: OcrDocument = serde_json::from_slice(bytes)?;
    raw.into_document()
}

impl OcrDocument {
    pub fn into_document(self) -> Result<Document> {
        if self.pages.is_none() && self.entities.is_none() {
            return Err(ScanError::MalformedPayload(
                "payload has neither pages nor entities".into(),
            ));
        }

        let pages = self
            .pages
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, page)| page.into_page(index))
            .collect::<Result<Vec<_>>>()?;

        let entities = self
            .entities
            .unwrap_or_default()
            .into_iter()
            .map(OcrEntity::into_group)
            .collect::<Result<Vec<_>>>()?;

        let doc = Document { pages, entities };
        debug!(
            pages = doc.pages.len(),
            tokens = doc.token_count(),
            entities = doc.entities.len(),
            "Validated OCR payload"
        );
        Ok(doc)
    }
}

impl OcrPage {
    fn into_page(self, index: usize) -> Result<Page> {
        let tokens = self
            .tokens
            .into_iter()
            .enumerate()
            .filter(|(_, t)| !t.text.trim().is_empty())
            .map(|(i, t)| t.into_token(index, i))
            .collect::<Result<Vec<_>>>()?;

        let tables = self
            .tables
            .into_iter()
            .map(|t| GridTable {
                header_rows: t.header_rows,
                body_rows: t.body_rows,
            })
            .collect();

        Ok(Page {
            index,
            tokens,
            lines: self.lines,
            tables,
        })
    }
}

impl OcrToken {
    fn into_token(self, page: usize, token: usize) -> Result<Token> {
        let corrupt = |reason: String| ScanError::CorruptGeometry { page, token, reason };

        if self.vertices.is_empty() {
            return Err(corrupt("no vertices".into()));
        }
        for v in &self.vertices {
            if !v.x.is_finite() || !v.y.is_finite() {
                return Err(corrupt(format!("non-finite vertex ({}, {})", v.x, v.y)));
            }
            let range = -EDGE_SLACK..=1.0 + EDGE_SLACK;
            if !range.contains(&v.x) || !range.contains(&v.y) {
                return Err(corrupt(format!("vertex ({}, {}) off the page", v.x, v.y)));
            }
        }

        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let x_min = self.vertices.iter().map(|v| clamp(v.x)).fold(f64::INFINITY, f64::min);
        let x_max = self.vertices.iter().map(|v| clamp(v.x)).fold(f64::NEG_INFINITY, f64::max);
        let y_center =
            self.vertices.iter().map(|v| clamp(v.y)).sum::<f64>() / self.vertices.len() as f64;

        Ok(Token::new(self.text.trim(), page, x_min, x_max, y_center))
    }
}

impl OcrEntity {
    fn into_group(self) -> Result<EntityGroup> {
        if self.kind.trim().is_empty() {
            return Err(ScanError::MalformedPayload("entity without a type".into()));
        }
        let properties = self
            .properties
            .into_iter()
            .map(|p| {
                if p.kind.trim().is_empty() {
                    return Err(ScanError::MalformedPayload(format!(
                        "property without a type in entity '{}'",
                        self.kind
                    )));
                }
                let value = p
                    .normalized_value
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(p.mention_text);
                Ok(EntityProperty {
                    kind: p.kind,
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EntityGroup {
            kind: self.kind,
            mention_text: self.mention_text,
            confidence: self.confidence,
            properties,
        })
    }
}
