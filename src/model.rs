//! Snapshot entities shared by the spatial and scoring stages.

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::scoring::grade::{FarePolicy, IntegrationLevel, OnlineInfo};

/// A raw (latitude, longitude) pair as read from a stop or residence table.
/// Values may be scaled integers until normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    #[serde(alias = "Latitude", alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "Longitude", alias = "lon", alias = "lng")]
    pub longitude: f64,
}

impl GeoCoord {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `geo` convention: x = longitude, y = latitude.
    pub fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrsTag {
    /// WGS84 degrees, x = longitude.
    Geographic,
    /// Projected metres.
    Planar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// Row position in the stop table.
    pub id: usize,
    pub location: Coord<f64>,
    pub crs: CrsTag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residence {
    pub id: usize,
    pub raw: GeoCoord,
    pub location: Coord<f64>,
}

/// Route-level survey attributes feeding the non-spatial indicators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteAttributes {
    pub paved_fraction: Option<f64>,
    pub integration: IntegrationLevel,
    pub driver_training: Option<f64>,
    pub online_info: OnlineInfo,
    pub fare_policy: FarePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    /// Vertices in WGS84 degrees.
    pub geometry: LineString<f64>,
    /// Same vertices in the planar CRS.
    pub planar: LineString<f64>,
    pub length_km: f64,
    pub attributes: RouteAttributes,
}

/// Nearest stop for one residence. Distance is in planar metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Association {
    pub residence_id: usize,
    pub stop_id: usize,
    pub distance_m: f64,
}
