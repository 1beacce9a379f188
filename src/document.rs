// src/document.rs

//! Validated document model handed to the scan pipeline.
//!
//! Everything here is built once by the OCR adapter (`crate::ocr`) and never
//! mutated afterwards. Geometry is page-normalized: `(0, 0)` is the top-left
//! corner and `(1, 1)` the bottom-right one.

use crate::barcode::Barcode;
use crate::layout::rows::cluster_by_y;
use crate::number::{parse_integer, parse_number};
use std::cell::OnceCell;

/// Page center, the pivot for skew correction.
pub const PAGE_CENTER: (f64, f64) = (0.5, 0.5);

/// One OCR word with its position on the page.
#[derive(Debug, Clone)]
pub struct Token {
    text: String,
    page: usize,
    x_center: f64,
    x_min: f64,
    x_max: f64,
    y_center: f64,
    value: OnceCell<Option<f64>>,
}

impl Token {
    pub fn new(text: impl Into<String>, page: usize, x_min: f64, x_max: f64, y_center: f64) -> Self {
        Self {
            text: text.into(),
            page,
            x_center: (x_min + x_max) / 2.0,
            x_min,
            x_max,
            y_center,
            value: OnceCell::new(),
        }
    }

    /// Token centered on `(x_center, y_center)` with the given width.
    pub fn centered(
        text: impl Into<String>,
        page: usize,
        x_center: f64,
        y_center: f64,
        width: f64,
    ) -> Self {
        let half = width / 2.0;
        Self::new(text, page, x_center - half, x_center + half, y_center)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn x_center(&self) -> f64 {
        self.x_center
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_center(&self) -> f64 {
        self.y_center
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Numeric value of the text, parsed on first use.
    pub fn value(&self) -> Option<f64> {
        *self.value.get_or_init(|| parse_number(&self.text))
    }

    /// Value of a separator-free digit run.
    pub fn integer(&self) -> Option<i64> {
        parse_integer(&self.text)
    }

    pub fn barcode(&self) -> Option<Barcode> {
        Barcode::parse(&self.text)
    }

    /// Copy of this token rotated by `angle` radians about the page center.
    ///
    /// Only the center moves; the width is preserved.
    pub fn rotated(&self, angle: f64) -> Token {
        let (cx, cy) = PAGE_CENTER;
        let (sin, cos) = angle.sin_cos();
        let dx = self.x_center - cx;
        let dy = self.y_center - cy;
        let x = cx + dx * cos - dy * sin;
        let y = cy + dx * sin + dy * cos;
        let half = self.width() / 2.0;

        Token {
            text: self.text.clone(),
            page: self.page,
            x_center: x,
            x_min: x - half,
            x_max: x + half,
            y_center: y,
            value: self.value.clone(),
        }
    }
}

/// Grid structure detected by the OCR service, cell texts only.
#[derive(Debug, Clone, Default)]
pub struct GridTable {
    pub header_rows: Vec<Vec<String>>,
    pub body_rows: Vec<Vec<String>>,
}

/// One property of a structured-extraction entity.
#[derive(Debug, Clone)]
pub struct EntityProperty {
    pub kind: String,
    pub value: String,
}

/// Named key/value group emitted by a custom extraction model.
#[derive(Debug, Clone)]
pub struct EntityGroup {
    pub kind: String,
    pub mention_text: String,
    pub confidence: Option<f64>,
    pub properties: Vec<EntityProperty>,
}

impl EntityGroup {
    /// First non-empty value among the given property names.
    pub fn property(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| {
            self.properties
                .iter()
                .find(|p| p.kind.eq_ignore_ascii_case(name))
                .map(|p| p.value.trim())
                .filter(|v| !v.is_empty())
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub index: usize,
    pub tokens: Vec<Token>,
    pub lines: Vec<String>,
    pub tables: Vec<GridTable>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
    pub entities: Vec<EntityGroup>,
}

impl Document {
    /// Nothing the pipeline could work with.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self
                .pages
                .iter()
                .all(|p| p.tokens.is_empty() && p.lines.is_empty() && p.tables.is_empty())
    }

    pub fn token_count(&self) -> usize {
        self.pages.iter().map(|p| p.tokens.len()).sum()
    }

    /// Text lines in document order.
    ///
    /// Pages without OCR lines get them rebuilt from their tokens by vertical
    /// clustering within `band`.
    pub fn text_lines(&self, band: f64) -> Vec<String> {
        let mut lines = Vec::new();
        for page in &self.pages {
            if !page.lines.is_empty() {
                lines.extend(page.lines.iter().map(|l| l.trim().to_string()));
                continue;
            }
            for row in cluster_by_y(page.tokens.clone(), band) {
                let text = row
                    .tokens()
                    .iter()
                    .map(Token::text)
                    .collect::<Vec<_>>()
                    .join(" ");
                lines.push(text);
            }
        }
        lines.retain(|l| !l.is_empty());
        lines
    }
}
