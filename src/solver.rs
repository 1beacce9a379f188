// src/solver.rs

//! Assigns financial roles to the unlabeled numbers of one report row.
//!
//! Column positions are unreliable on photographed paper, but the arithmetic
//! between the figures is not: cost plus profit gives the line total, and unit
//! price times quantity gives it too. The solver looks for those relations
//! first and only falls back to value ordering when neither holds.

use crate::config::SolverConfig;
use crate::number::{BARCODE_LIKE_MIN, parse_integer, parse_number, round_cents};
use serde::Serialize;
use tracing::debug;

/// How the roles of a row were decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    /// `cost + profit = total`
    AdditiveTriple,
    /// `unit_price × quantity = total`
    Multiplicative,
    /// Smallest, median and largest value.
    Positional,
    /// Nothing to work with.
    Empty,
}

/// Financial fields of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Financials {
    pub unit_price: Option<f64>,
    pub cost: Option<f64>,
    pub profit: Option<f64>,
    pub total: Option<f64>,
    pub quantity: i32,
    pub method: SolveMethod,
}

/// Numbers of a row split into monetary values and quantity candidates.
///
/// A whole number like `120` can be either, so it lands in both lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericPool {
    pub values: Vec<f64>,
    pub candidates: Vec<i32>,
}

impl NumericPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one numeric text and add it.
    pub fn push_text(&mut self, text: &str, cfg: &SolverConfig) {
        if let Some(n) = parse_integer(text) {
            if (n as f64) >= BARCODE_LIKE_MIN {
                return;
            }
            if n > 0 && n <= cfg.max_quantity {
                self.push_candidate(n as i32);
            }
            if n as f64 >= cfg.pool_int_min {
                self.values.push(n as f64);
            }
            return;
        }
        if let Some(v) = parse_number(text) {
            if v < BARCODE_LIKE_MIN {
                self.values.push(v);
            }
        }
    }

    pub fn push_candidate(&mut self, q: i32) {
        if q > 0 && !self.candidates.contains(&q) {
            self.candidates.push(q);
        }
    }

    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>, cfg: &SolverConfig) -> Self {
        let mut pool = Self::new();
        for text in texts {
            pool.push_text(text, cfg);
        }
        pool
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.candidates.is_empty()
    }
}

/// Solve one row.
///
/// `exact` is a quantity read from a quantity column; it is tried before the
/// other candidates and also wins the default when no relation holds.
pub fn solve(pool: &NumericPool, exact: Option<i32>, cfg: &SolverConfig) -> Financials {
    let values: Vec<f64> = pool
        .values
        .iter()
        .copied()
        .filter(|v| *v >= cfg.min_value)
        .collect();

    let mut quantities: Vec<i32> = Vec::with_capacity(pool.candidates.len() + 1);
    if let Some(q) = exact.filter(|q| *q > 0) {
        quantities.push(q);
    }
    for q in &pool.candidates {
        if !quantities.contains(q) {
            quantities.push(*q);
        }
    }
    let default_quantity = quantities.first().copied().unwrap_or(1);

    let mut out = additive_triple(&values, &quantities, cfg)
        .or_else(|| multiplicative(&values, &quantities, cfg))
        .unwrap_or_else(|| positional(&values, default_quantity));

    complete_identity(&mut out);
    debug!(
        method = ?out.method,
        quantity = out.quantity,
        unit_price = ?out.unit_price,
        total = ?out.total,
        "Solved row"
    );
    out
}

fn additive_triple(values: &[f64], quantities: &[i32], cfg: &SolverConfig) -> Option<Financials> {
    let n = values.len();
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                if i == j || j == k || i == k {
                    continue;
                }
                let (a, b, c) = (values[i], values[j], values[k]);
                if (a + b - c).abs() >= cfg.tolerance {
                    continue;
                }

                let remaining: Vec<f64> = values
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != i && *idx != j && *idx != k)
                    .map(|(_, v)| *v)
                    .collect();

                let priced = quantities.iter().find_map(|q| {
                    remaining
                        .iter()
                        .find(|r| (*r * f64::from(*q) - c).abs() < cfg.tolerance)
                        .map(|r| (*r, *q))
                });
                let (unit_price, quantity) = match priced {
                    Some((p, q)) => (Some(p), q),
                    None => (None, quantities.first().copied().unwrap_or(1)),
                };

                return Some(Financials {
                    unit_price,
                    cost: Some(a.max(b)),
                    profit: Some(a.min(b)),
                    total: Some(c),
                    quantity,
                    method: SolveMethod::AdditiveTriple,
                });
            }
        }
    }
    None
}

fn multiplicative(values: &[f64], quantities: &[i32], cfg: &SolverConfig) -> Option<Financials> {
    for q in quantities {
        let qf = f64::from(*q);
        for (i, p) in values.iter().enumerate() {
            for (j, t) in values.iter().enumerate() {
                if i == j {
                    continue;
                }
                if (p * qf - t).abs() < cfg.tolerance {
                    return Some(Financials {
                        unit_price: Some(*p),
                        cost: None,
                        profit: None,
                        total: Some(*t),
                        quantity: *q,
                        method: SolveMethod::Multiplicative,
                    });
                }
            }
        }
    }
    None
}

fn positional(values: &[f64], quantity: i32) -> Financials {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let (cost, unit_price, total, method) = match sorted.as_slice() {
        [] => (None, None, None, SolveMethod::Empty),
        [v] => (None, Some(*v), Some(*v), SolveMethod::Positional),
        [lo, hi] => (None, Some(*lo), Some(*hi), SolveMethod::Positional),
        s => (
            Some(s[0]),
            Some(s[s.len() / 2]),
            Some(s[s.len() - 1]),
            SolveMethod::Positional,
        ),
    };
    Financials {
        unit_price,
        cost,
        profit: None,
        total,
        quantity,
        method,
    }
}

fn complete_identity(f: &mut Financials) {
    let q = f64::from(f.quantity.max(1));
    match (f.unit_price, f.total) {
        (None, Some(t)) => f.unit_price = Some(round_cents(t / q)),
        (Some(p), None) => f.total = Some(round_cents(p * q)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(values: &[f64], candidates: &[i32]) -> NumericPool {
        NumericPool {
            values: values.to_vec(),
            candidates: candidates.to_vec(),
        }
    }

    #[test]
    fn test_additive_triple() {
        let cfg = SolverConfig::default();
        let f = solve(&pool(&[84.0, 36.0, 120.0], &[]), None, &cfg);
        assert_eq!(f.method, SolveMethod::AdditiveTriple);
        assert_eq!(f.cost, Some(84.0));
        assert_eq!(f.profit, Some(36.0));
        assert_eq!(f.total, Some(120.0));
        assert_eq!(f.quantity, 1);
        assert_eq!(f.unit_price, Some(120.0));
    }

    #[test]
    fn test_additive_triple_picks_quantity_from_unit_price() {
        let cfg = SolverConfig::default();
        // 3 × 40 = 120; 7 is a stray candidate that explains nothing
        let f = solve(&pool(&[84.0, 36.0, 120.0, 40.0], &[7, 3]), None, &cfg);
        assert_eq!(f.quantity, 3);
        assert_eq!(f.unit_price, Some(40.0));
        assert_eq!(f.cost, Some(84.0));
    }

    #[test]
    fn test_multiplicative_pair() {
        let cfg = SolverConfig::default();
        let f = solve(&pool(&[15.0, 30.0], &[2]), None, &cfg);
        assert_eq!(f.method, SolveMethod::Multiplicative);
        assert_eq!(f.unit_price, Some(15.0));
        assert_eq!(f.total, Some(30.0));
        assert_eq!(f.quantity, 2);
    }

    #[test]
    fn test_exact_quantity_yields_when_arithmetic_fails() {
        let cfg = SolverConfig::default();
        let f = solve(&pool(&[15.0, 45.0], &[3]), Some(2), &cfg);
        assert_eq!(f.quantity, 3);
        assert_eq!(f.total, Some(45.0));
    }

    #[test]
    fn test_exact_quantity_tried_first() {
        let cfg = SolverConfig::default();
        // both 2 × 10 = 20 and 4 × 10 = 40 hold
        let f = solve(&pool(&[10.0, 20.0, 40.0], &[4]), Some(2), &cfg);
        assert_eq!(f.quantity, 2);
        assert_eq!(f.total, Some(20.0));
    }

    #[test]
    fn test_positional_fallback() {
        let cfg = SolverConfig::default();
        let f = solve(&pool(&[71.3, 12.9, 250.0], &[]), None, &cfg);
        assert_eq!(f.method, SolveMethod::Positional);
        assert_eq!(f.cost, Some(12.9));
        assert_eq!(f.unit_price, Some(71.3));
        assert_eq!(f.total, Some(250.0));

        let f = solve(&pool(&[99.9], &[]), None, &cfg);
        assert_eq!(f.unit_price, Some(99.9));
        assert_eq!(f.total, Some(99.9));
    }

    #[test]
    fn test_identity_completion() {
        let cfg = SolverConfig::default();
        let f = solve(&pool(&[84.0, 36.0, 120.0], &[7]), None, &cfg);
        // no remaining value explains 120 / 7, so price is derived
        assert_eq!(f.quantity, 7);
        assert_eq!(f.unit_price, Some(17.14));
    }

    #[test]
    fn test_empty_pool() {
        let cfg = SolverConfig::default();
        let f = solve(&pool(&[0.001], &[]), None, &cfg);
        assert_eq!(f.method, SolveMethod::Empty);
        assert_eq!(f.total, None);
        assert_eq!(f.quantity, 1);
    }

    #[test]
    fn test_pool_classification() {
        let cfg = SolverConfig::default();
        let p = NumericPool::from_texts(
            ["2", "120", "15,50", "3001234567890", "1200", "PAROL"],
            &cfg,
        );
        assert_eq!(p.candidates, vec![2, 120]);
        assert_eq!(p.values, vec![120.0, 15.5, 1200.0]);
    }
}
