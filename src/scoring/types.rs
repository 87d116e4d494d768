//! Data types used by the scoring pipeline.

use serde::Serialize;

use crate::model::GeoCoord;

pub const INDICATOR_COUNT: usize = 10;

/// Indicator codes in weight order.
pub const INDICATOR_CODES: [&str; INDICATOR_COUNT] =
    ["I1", "I2", "I3", "I4", "I5", "I6", "I7", "I8", "I9", "I10"];

/// Raw per-route metrics. `None` means the input stage produced nothing for the route.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteMetrics {
    pub paved_fraction: Option<f64>,
    pub mean_distance_m: Option<f64>,
    pub punctuality: Option<f64>,
    pub headway_min: Option<f64>,
    pub coverage_proportion: Option<f64>,
    pub driver_training: Option<f64>,
    pub completion_ratio: Option<f64>,
}

/// Ten ordinal scores, one slot per indicator. `None` is a missing score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorScores(pub [Option<u8>; INDICATOR_COUNT]);

impl IndicatorScores {
    /// Aggregation input: missing scores become 0.
    pub fn to_vector(&self) -> [f64; INDICATOR_COUNT] {
        self.0.map(|s| f64::from(s.unwrap_or(0)))
    }

    /// Reported scores: missing scores become 0.
    pub fn resolved(&self) -> [u8; INDICATOR_COUNT] {
        self.0.map(|s| s.unwrap_or(0))
    }

    pub fn missing(&self) -> Vec<&'static str> {
        self.0
            .iter()
            .zip(INDICATOR_CODES)
            .filter(|(s, _)| s.is_none())
            .map(|(_, code)| code)
            .collect()
    }
}

/// Qualitative IQT class, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IqtClass {
    Excellent,
    Good,
    Sufficient,
    Insufficient,
}

impl IqtClass {
    pub fn label(&self) -> &'static str {
        match self {
            IqtClass::Excellent => "Excellent",
            IqtClass::Good => "Good",
            IqtClass::Sufficient => "Sufficient",
            IqtClass::Insufficient => "Insufficient",
        }
    }
}

impl std::fmt::Display for IqtClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A served stop positioned for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServedStop {
    pub stop_id: usize,
    pub latitude: f64,
    pub longitude: f64,
}

impl ServedStop {
    pub fn new(stop_id: usize, position: GeoCoord) -> Self {
        Self {
            stop_id,
            latitude: position.latitude,
            longitude: position.longitude,
        }
    }
}

/// Final per-route result handed to the export layer.
///
/// Flat so it serializes as a single CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteReport {
    pub route_id: String,
    pub i1: u8,
    pub i2: u8,
    pub i3: u8,
    pub i4: u8,
    pub i5: u8,
    pub i6: u8,
    pub i7: u8,
    pub i8: u8,
    pub i9: u8,
    pub i10: u8,
    pub iqt: f64,
    pub class: IqtClass,
    pub color: &'static str,
    pub length_km: f64,
    pub mean_distance_m: Option<f64>,
    pub coverage_proportion: Option<f64>,
    pub punctuality: Option<f64>,
    pub headway_min: Option<f64>,
    pub completion_ratio: Option<f64>,
    #[serde(skip)]
    pub served_stops: Vec<ServedStop>,
}

impl RouteReport {
    pub fn scores(&self) -> [u8; INDICATOR_COUNT] {
        [
            self.i1, self.i2, self.i3, self.i4, self.i5, self.i6, self.i7, self.i8, self.i9,
            self.i10,
        ]
    }
}

/// JSON export shape: the CSV row plus served stop positions.
#[derive(Debug, Serialize)]
pub struct RouteReportJson<'a> {
    #[serde(flatten)]
    pub report: &'a RouteReport,
    pub served_stops: &'a [ServedStop],
}

impl<'a> From<&'a RouteReport> for RouteReportJson<'a> {
    fn from(report: &'a RouteReport) -> Self {
        Self {
            report,
            served_stops: &report.served_stops,
        }
    }
}
