// src/layout/skew.rs

//! Page skew estimation from the printed header line.

use super::header::is_header_vocabulary;
use crate::config::GeometryConfig;
use crate::document::Token;
use tracing::debug;

/// Skew angle of a page in radians, measured on its header words.
///
/// Fits `y = a + b·x` through the header-vocabulary tokens and returns
/// `atan(b)`. Returns 0 when fewer than `min_header_tokens` header words are
/// present, and also when the fitted angle exceeds `max_skew_degrees`.
pub fn estimate_skew(tokens: &[Token], cfg: &GeometryConfig) -> f64 {
    let points: Vec<(f64, f64)> = tokens
        .iter()
        .filter(|t| is_header_vocabulary(t))
        .map(|t| (t.x_center(), t.y_center()))
        .collect();

    if points.len() < cfg.min_header_tokens {
        return 0.0;
    }

    let Some(slope) = least_squares_slope(&points) else {
        return 0.0;
    };

    let angle = slope.atan();
    if angle.abs() > cfg.max_skew_degrees.to_radians() {
        debug!(
            degrees = angle.to_degrees(),
            header_tokens = points.len(),
            "Skew fit exceeds clamp, ignoring"
        );
        return 0.0;
    }
    angle
}

/// Rotate every token by `-angle` about the page center.
pub fn deskew(tokens: &[Token], angle: f64) -> Vec<Token> {
    if angle == 0.0 {
        return tokens.to_vec();
    }
    tokens.iter().map(|t| t.rotated(-angle)).collect()
}

fn least_squares_slope(points: &[(f64, f64)]) -> Option<f64> {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for &(x, y) in points {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x) * (x - mean_x);
    }
    // All header words stacked in one column: no line to fit.
    if sxx < 1e-9 {
        return None;
    }
    Some(sxy / sxx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_WORDS: [&str; 5] = ["Barkod", "Ürün", "Adet", "Fiyat", "Tutar"];

    fn slanted_header(degrees: f64) -> Vec<Token> {
        let slope = degrees.to_radians().tan();
        HEADER_WORDS
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let x = 0.1 + 0.2 * i as f64;
                Token::centered(*word, 0, x, 0.2 + slope * (x - 0.1), 0.06)
            })
            .collect()
    }

    #[test]
    fn test_three_degree_skew_is_corrected() {
        let cfg = GeometryConfig::default();
        let tokens = slanted_header(3.0);
        let angle = estimate_skew(&tokens, &cfg);
        assert!((angle.to_degrees() - 3.0).abs() < 1e-6);

        let straightened = deskew(&tokens, angle);
        let points: Vec<_> = straightened
            .iter()
            .map(|t| (t.x_center(), t.y_center()))
            .collect();
        let residual = least_squares_slope(&points).unwrap().atan().to_degrees();
        assert!(residual.abs() < 0.1, "residual slope {residual}°");
    }

    #[test]
    fn test_large_skew_is_not_applied() {
        let cfg = GeometryConfig::default();
        let tokens = slanted_header(20.0);
        assert_eq!(estimate_skew(&tokens, &cfg), 0.0);

        let untouched = deskew(&tokens, estimate_skew(&tokens, &cfg));
        for (a, b) in tokens.iter().zip(&untouched) {
            assert_eq!(a.y_center(), b.y_center());
        }
    }

    #[test]
    fn test_too_few_header_tokens() {
        let cfg = GeometryConfig::default();
        let tokens = vec![
            Token::centered("Barkod", 0, 0.1, 0.2, 0.06),
            Token::centered("Tutar", 0, 0.9, 0.25, 0.06),
            Token::centered("15,00", 0, 0.5, 0.4, 0.06),
        ];
        assert_eq!(estimate_skew(&tokens, &cfg), 0.0);
    }
}
