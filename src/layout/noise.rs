// src/layout/noise.rs

use super::rows::Row;
use crate::config::NoiseConfig;
use crate::number::{BARCODE_LIKE_MIN, is_small_positive_int};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Numeric values that repeat across too many rows to belong to any one of
/// them: a footer figure the OCR smeared over the table, a column-wide tax
/// rate, and so on. These never take a financial role.
#[derive(Debug, Clone, Default)]
pub struct NoiseBlacklist {
    cents: HashSet<i64>,
}

impl NoiseBlacklist {
    /// Count, per distinct value, the rows it occurs in, and blacklist values
    /// seen in more than `max(min_repeat_rows, repeat_ratio × rows)` rows.
    ///
    /// Small whole numbers are exempt: many rows legitimately sell exactly
    /// one unit.
    pub fn build<'a>(rows: impl IntoIterator<Item = &'a Row>, cfg: &NoiseConfig) -> Self {
        let mut counts: HashMap<i64, (usize, f64)> = HashMap::new();
        let mut row_count = 0usize;

        for row in rows {
            row_count += 1;
            let distinct: HashSet<i64> = row
                .tokens()
                .iter()
                .filter_map(|t| t.value())
                .filter(|v| *v < BARCODE_LIKE_MIN)
                .map(cents_key)
                .collect();
            for key in distinct {
                let entry = counts.entry(key).or_insert((0, key as f64 / 100.0));
                entry.0 += 1;
            }
        }

        let threshold = (cfg.min_repeat_rows as f64).max(cfg.repeat_ratio * row_count as f64);
        let cents: HashSet<i64> = counts
            .into_iter()
            .filter(|(_, (count, value))| {
                *count as f64 > threshold && !is_small_positive_int(*value, cfg.small_int_limit)
            })
            .map(|(key, _)| key)
            .collect();

        if !cents.is_empty() {
            debug!(
                values = ?cents.iter().map(|c| *c as f64 / 100.0).collect::<Vec<_>>(),
                threshold,
                "Blacklisted repeating values"
            );
        }
        Self { cents }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.cents.contains(&cents_key(value))
    }

    pub fn len(&self) -> usize {
        self.cents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cents.is_empty()
    }
}

fn cents_key(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Token;

    fn row(i: usize, values: &[&str]) -> Row {
        let y = 0.1 + 0.03 * i as f64;
        let mut tokens = vec![Token::centered("3001234567890", 0, 0.1, y, 0.1)];
        for (j, v) in values.iter().enumerate() {
            tokens.push(Token::centered(*v, 0, 0.5 + 0.1 * j as f64, y, 0.05));
        }
        Row::new(tokens, None)
    }

    #[test]
    fn test_repeating_decimal_is_blacklisted() {
        // 99,90 shows up in 5 of 10 rows (> 40%)
        let rows: Vec<Row> = (0..10)
            .map(|i| {
                let price = format!("{},50", 10 + i);
                if i % 2 == 0 {
                    row(i, &["1", &price, "99,90"])
                } else {
                    row(i, &["1", &price])
                }
            })
            .collect();
        let blacklist = NoiseBlacklist::build(&rows, &NoiseConfig::default());
        assert!(blacklist.contains(99.90));
        assert!(!blacklist.contains(10.50));
        // quantity 1 in every row stays usable
        assert!(!blacklist.contains(1.0));
        assert_eq!(blacklist.len(), 1);
    }

    #[test]
    fn test_small_documents_use_fixed_threshold() {
        let rows: Vec<Row> = (0..3).map(|i| row(i, &["7,25"])).collect();
        let blacklist = NoiseBlacklist::build(&rows, &NoiseConfig::default());
        assert!(blacklist.is_empty());
    }
}
