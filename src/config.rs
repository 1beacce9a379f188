use crate::layout::header::HeaderField;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

/// Host configuration, `.config/pharma_scan.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub scan: ScanConfig,
}

fn default_db_path() -> String {
    "scanstore/scans.db".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            scan: ScanConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Like [`AppConfig::load`], but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

/// Every tunable of the scan pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub geometry: GeometryConfig,
    pub noise: NoiseConfig,
    pub zones: ZoneConfig,
    pub solver: SolverConfig,
    pub strategy: StrategyConfig,
    pub confidence: ConfidenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub max_skew_degrees: f64,
    pub min_header_tokens: usize,
    /// Row band in degraded mode, as a share of page height.
    pub row_band: f64,
    pub anchor_spacing_factor: f64,
    pub anchor_tolerance_floor: f64,
    pub anchor_tolerance_ceiling: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            max_skew_degrees: 5.0,
            min_header_tokens: 3,
            row_band: 0.012,
            anchor_spacing_factor: 0.75,
            anchor_tolerance_floor: 0.015,
            anchor_tolerance_ceiling: 0.08,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub min_repeat_rows: usize,
    pub repeat_ratio: f64,
    pub small_int_limit: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            min_repeat_rows: 3,
            repeat_ratio: 0.4,
            small_int_limit: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneBand {
    pub field: HeaderField,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Left bound the first zone may not cross; the product name lives there.
    pub first_zone_floor: f64,
    pub single_header_half_width: f64,
    pub virtual_header_spacing: f64,
    pub header_merge_gap: f64,
    pub default_bands: Vec<ZoneBand>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        let band = |field, start, end| ZoneBand { field, start, end };
        Self {
            first_zone_floor: 0.30,
            single_header_half_width: 0.05,
            virtual_header_spacing: 0.08,
            header_merge_gap: 0.02,
            default_bands: vec![
                band(HeaderField::Quantity, 0.45, 0.52),
                band(HeaderField::UnitPrice, 0.52, 0.62),
                band(HeaderField::Stock, 0.62, 0.68),
                band(HeaderField::Cost, 0.68, 0.78),
                band(HeaderField::Profit, 0.78, 0.88),
                band(HeaderField::Total, 0.88, 1.0),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_quantity: i64,
    pub pool_int_min: f64,
    pub min_value: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.5,
            max_quantity: 500,
            pool_int_min: 50.0,
            min_value: 0.01,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub columnar_min_value: f64,
    pub exact_quantity_max: i32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            columnar_min_value: 100.0,
            exact_quantity_max: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub entities: f64,
    pub grid: f64,
    pub geometry: f64,
    pub sequential: f64,
    pub columnar: f64,
    pub full_bonus: f64,
    pub total_bonus: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            entities: 0.95,
            grid: 0.90,
            geometry: 0.85,
            sequential: 0.75,
            columnar: 0.60,
            full_bonus: 1.15,
            total_bonus: 1.05,
        }
    }
}
