// src/strategy/mod.rs

//! Ways of reading sale lines off a document, from the most trusted signal to
//! the least.

mod columnar;
mod entities;
mod geometry;
mod grid;
mod sequential;

pub use columnar::ColumnarBlock;
pub use entities::StructuredEntities;
pub use geometry::GeometryReconstruction;
pub use grid::GridTable;
pub use sequential::SequentialLineHeuristic;

use crate::cancel::CancelCheck;
use crate::config::ScanConfig;
use crate::document::Document;
use crate::error::Result;
use crate::line::ResolvedLine;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    StructuredEntities,
    GridTable,
    GeometryReconstruction,
    SequentialLineHeuristic,
    ColumnarBlock,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::StructuredEntities => "structured_entities",
            StrategyKind::GridTable => "grid_table",
            StrategyKind::GeometryReconstruction => "geometry_reconstruction",
            StrategyKind::SequentialLineHeuristic => "sequential_line_heuristic",
            StrategyKind::ColumnarBlock => "columnar_block",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a strategy may look at.
pub struct ParseContext<'a> {
    pub document: &'a Document,
    /// Text lines in document order, synthesized where OCR gave none.
    pub lines: &'a [String],
    pub config: &'a ScanConfig,
    pub cancel: &'a dyn CancelCheck,
}

pub trait ParseStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Candidate lines, not yet checked against the catalog.
    ///
    /// Only cancellation is an error; a document the strategy cannot read
    /// yields no lines.
    fn parse(&self, ctx: &ParseContext<'_>) -> Result<Vec<ResolvedLine>>;
}

/// The fixed fallback order.
pub fn default_chain() -> Vec<Box<dyn ParseStrategy>> {
    vec![
        Box::new(StructuredEntities),
        Box::new(GridTable),
        Box::new(GeometryReconstruction),
        Box::new(SequentialLineHeuristic),
        Box::new(ColumnarBlock),
    ]
}
