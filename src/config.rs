use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scoring::aggregate::{DEFAULT_WEIGHTS, Weights};

/// Distance below which a residence counts as covered by a stop.
pub const DEFAULT_COVERAGE_THRESHOLD_M: f64 = 400.0;

/// Divisor applied to tables whose coordinates were exported as scaled integers.
pub const DEFAULT_PRESCALE_FACTOR: f64 = 1_000_000.0;

/// Planar CRS used for every metric distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanarCrs {
    /// WGS84 UTM zone picked from the centre of the stop table.
    Auto,
    /// Explicit WGS84 UTM zone.
    Utm { zone: u8, south: bool },
}

impl Default for PlanarCrs {
    /// UTM 23S, which covers the region the indicator thresholds were calibrated on.
    fn default() -> Self {
        PlanarCrs::Utm {
            zone: 23,
            south: true,
        }
    }
}

/// Run configuration. Stored as a JSON object on disk, every field optional:
/// ```json
/// {
///   "weights": [0.1526, 0.1121, 0.0997, 0.2269, 0.0992, 0.0831, 0.0954, 0.0756, 0.0277, 0.0277],
///   "coverage_threshold_m": 400.0,
///   "planar_crs": { "utm": { "zone": 23, "south": true } },
///   "prescale_factor": 1000000.0
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IqtConfig {
    pub weights: Vec<f64>,
    pub coverage_threshold_m: f64,
    pub planar_crs: PlanarCrs,
    pub prescale_factor: f64,
}

impl Default for IqtConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
            coverage_threshold_m: DEFAULT_COVERAGE_THRESHOLD_M,
            planar_crs: PlanarCrs::default(),
            prescale_factor: DEFAULT_PRESCALE_FACTOR,
        }
    }
}

impl IqtConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        let config: IqtConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the validated weight vector.
    pub fn weights(&self) -> Result<Weights> {
        Ok(Weights::new(&self.weights)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights()?;
        if !(self.coverage_threshold_m.is_finite() && self.coverage_threshold_m > 0.0) {
            anyhow::bail!(
                "coverage_threshold_m must be positive, got {}",
                self.coverage_threshold_m
            );
        }
        if !(self.prescale_factor.is_finite() && self.prescale_factor > 0.0) {
            anyhow::bail!("prescale_factor must be positive, got {}", self.prescale_factor);
        }
        if let PlanarCrs::Utm { zone, .. } = self.planar_crs {
            if !(1..=60).contains(&zone) {
                anyhow::bail!("UTM zone must be within 1..=60, got {zone}");
            }
        }
        Ok(())
    }
}
