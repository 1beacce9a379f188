// src/layout/rows.rs

//! Row reconstruction: barcode-anchored clustering with a plain Y-band
//! fallback.

use crate::barcode::Barcode;
use crate::config::GeometryConfig;
use crate::document::Token;
use tracing::debug;

/// Tokens of one printed report line, ordered left to right.
#[derive(Debug, Clone)]
pub struct Row {
    tokens: Vec<Token>,
    anchor: Option<Barcode>,
    y_center: f64,
}

impl Row {
    pub fn new(mut tokens: Vec<Token>, anchor: Option<Barcode>) -> Self {
        tokens.sort_by(|a, b| a.x_center().total_cmp(&b.x_center()));
        let y_center = if tokens.is_empty() {
            0.0
        } else {
            tokens.iter().map(Token::y_center).sum::<f64>() / tokens.len() as f64
        };
        Self { tokens, anchor, y_center }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn anchor(&self) -> Option<&Barcode> {
        self.anchor.as_ref()
    }

    pub fn y_center(&self) -> f64 {
        self.y_center
    }

    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group tokens of one page into rows.
///
/// Tokens reading as a valid barcode anchor the rows; every other token joins
/// the nearest anchor vertically if it is within the adaptive tolerance and is
/// dropped otherwise. A page without any anchor falls back to Y-band
/// clustering, recovering split or decorated barcodes where it can.
pub fn reconstruct_rows(tokens: Vec<Token>, cfg: &GeometryConfig) -> Vec<Row> {
    let (anchors, others): (Vec<Token>, Vec<Token>) =
        tokens.into_iter().partition(|t| t.barcode().is_some());

    if anchors.is_empty() {
        debug!(tokens = others.len(), "No barcode anchors, clustering by Y band");
        return cluster_by_y(others, cfg.row_band)
            .into_iter()
            .map(|row| {
                let anchor = recover_anchor(row.tokens());
                Row::new(row.tokens, anchor)
            })
            .collect();
    }

    let mut anchors = anchors;
    anchors.sort_by(|a, b| a.y_center().total_cmp(&b.y_center()));
    let anchor_ys: Vec<f64> = anchors.iter().map(Token::y_center).collect();
    let tolerance = anchor_tolerance(&anchor_ys, cfg);

    let mut buckets: Vec<(Option<Barcode>, Vec<Token>)> = anchors
        .into_iter()
        .map(|a| (a.barcode(), vec![a]))
        .collect();

    let mut dropped = 0usize;
    for token in others {
        let nearest = anchor_ys
            .iter()
            .enumerate()
            .map(|(i, y)| (i, (token.y_center() - y).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest {
            Some((idx, dist)) if dist < tolerance => buckets[idx].1.push(token),
            _ => dropped += 1,
        }
    }

    debug!(
        rows = buckets.len(),
        tolerance,
        dropped,
        "Assigned tokens to nearest anchors"
    );

    buckets
        .into_iter()
        .map(|(anchor, tokens)| Row::new(tokens, anchor))
        .collect()
}

/// Plain Y clustering: a row collects tokens within `band` of its first
/// (top-most) token.
pub fn cluster_by_y(mut tokens: Vec<Token>, band: f64) -> Vec<Row> {
    tokens.sort_by(|a, b| a.y_center().total_cmp(&b.y_center()));

    let mut rows = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut start_y = 0.0;

    for token in tokens {
        if !current.is_empty() && (token.y_center() - start_y).abs() >= band {
            rows.push(Row::new(std::mem::take(&mut current), None));
        }
        if current.is_empty() {
            start_y = token.y_center();
        }
        current.push(token);
    }
    if !current.is_empty() {
        rows.push(Row::new(current, None));
    }
    rows
}

/// Vertical reach of an anchor: a share of the mean anchor spacing, kept
/// between a floor and a ceiling that tolerates paper curvature.
fn anchor_tolerance(sorted_ys: &[f64], cfg: &GeometryConfig) -> f64 {
    if sorted_ys.len() < 2 {
        return cfg.anchor_tolerance_floor * 2.0;
    }
    let span = sorted_ys[sorted_ys.len() - 1] - sorted_ys[0];
    let mean_spacing = span / (sorted_ys.len() - 1) as f64;
    (mean_spacing * cfg.anchor_spacing_factor)
        .clamp(cfg.anchor_tolerance_floor, cfg.anchor_tolerance_ceiling)
}

/// Find a barcode in a row that has no clean anchor token: a decorated token
/// (`*3001234567890.`) or a code split into adjacent digit fragments.
fn recover_anchor(tokens: &[Token]) -> Option<Barcode> {
    if let Some(bc) = tokens.iter().find_map(|t| Barcode::normalize(t.text())) {
        return Some(bc);
    }

    for start in 0..tokens.len() {
        let mut digits = String::new();
        for token in &tokens[start..] {
            let text = token.text().trim();
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                break;
            }
            digits.push_str(text);
            if digits.len() >= 13 {
                break;
            }
        }
        if digits.len() == 13 {
            if let Some(bc) = Barcode::parse(&digits) {
                return Some(bc);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, x: f64, y: f64) -> Token {
        Token::centered(text, 0, x, y, 0.05)
    }

    #[test]
    fn test_nearest_anchor_assignment() {
        let cfg = GeometryConfig::default();
        let tokens = vec![
            tok("3001234567890", 0.10, 0.200),
            tok("2", 0.50, 0.206),
            tok("30,00", 0.90, 0.195),
            tok("3009876543210", 0.10, 0.240),
            tok("1", 0.50, 0.244),
            tok("12,50", 0.90, 0.236),
            // page number far below every anchor
            tok("1/3", 0.50, 0.950),
        ];
        let rows = reconstruct_rows(tokens, &cfg);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].anchor().unwrap().as_str(), "3001234567890");
        assert_eq!(rows[0].text(), "3001234567890 2 30,00");
        assert_eq!(rows[1].text(), "3009876543210 1 12,50");
    }

    #[test]
    fn test_rows_do_not_share_tokens() {
        let cfg = GeometryConfig::default();
        let tokens = vec![
            tok("3001234567890", 0.1, 0.30),
            tok("3009876543210", 0.1, 0.33),
            tok("5,00", 0.9, 0.315),
        ];
        let rows = reconstruct_rows(tokens, &cfg);
        let total: usize = rows.iter().map(|r| r.tokens().len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_wrong_prefix_is_not_an_anchor() {
        let cfg = GeometryConfig::default();
        let tokens = vec![tok("8691234567890", 0.1, 0.3), tok("5,00", 0.9, 0.3)];
        let rows = reconstruct_rows(tokens, &cfg);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].anchor().is_none());
    }

    #[test]
    fn test_degraded_mode_recovers_split_barcode() {
        let cfg = GeometryConfig::default();
        let tokens = vec![
            tok("300123", 0.08, 0.40),
            tok("4567890", 0.14, 0.401),
            tok("15,00", 0.9, 0.402),
            tok("SAYFA", 0.5, 0.9),
        ];
        let rows = reconstruct_rows(tokens, &cfg);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].anchor().unwrap().as_str(), "3001234567890");
        assert!(rows[1].anchor().is_none());
    }

    #[test]
    fn test_cluster_by_y_band() {
        let rows = cluster_by_y(
            vec![tok("b", 0.5, 0.105), tok("a", 0.1, 0.100), tok("c", 0.1, 0.200)],
            0.012,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(), "a b");
    }
}
