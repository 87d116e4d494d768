use tracing::{debug, warn};

use crate::error::IqtError;
use crate::model::GeoCoord;

const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

/// A coordinate table after the scale check.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub coords: Vec<GeoCoord>,
    /// Whether the whole table was divided by the prescale factor.
    pub rescaled: bool,
}

/// Largest absolute latitude and longitude in the table. NaN propagates as infinity.
fn max_magnitudes(coords: &[GeoCoord]) -> (f64, f64) {
    coords.iter().fold((0.0_f64, 0.0_f64), |(lat, lon), c| {
        let abs = |v: f64| if v.is_finite() { v.abs() } else { f64::INFINITY };
        (lat.max(abs(c.latitude)), lon.max(abs(c.longitude)))
    })
}

/// True when every pair lies within geographic bounds.
pub fn within_geographic_bounds(coords: &[GeoCoord]) -> bool {
    let (lat, lon) = max_magnitudes(coords);
    lat <= MAX_LATITUDE && lon <= MAX_LONGITUDE
}

/// Checks a coordinate table and repairs a uniform integer pre-scale.
///
/// The decision is made for the whole table: if any value is out of bounds,
/// every row is divided by `prescale_factor`. A table still out of bounds
/// afterwards is rejected as corrupt.
pub fn normalize_table(
    table: &str,
    coords: &[GeoCoord],
    prescale_factor: f64,
) -> Result<NormalizedTable, IqtError> {
    if within_geographic_bounds(coords) {
        debug!(table, rows = coords.len(), "Coordinates already in decimal degrees");
        return Ok(NormalizedTable {
            coords: coords.to_vec(),
            rescaled: false,
        });
    }

    let rescaled: Vec<GeoCoord> = coords
        .iter()
        .map(|c| GeoCoord::new(c.latitude / prescale_factor, c.longitude / prescale_factor))
        .collect();

    if !within_geographic_bounds(&rescaled) {
        let (max_abs_latitude, max_abs_longitude) = max_magnitudes(&rescaled);
        return Err(IqtError::CoordinatesOutOfBounds {
            table: table.to_string(),
            max_abs_latitude,
            max_abs_longitude,
        });
    }

    warn!(
        table,
        rows = coords.len(),
        prescale_factor,
        "Coordinates out of geographic bounds, rescaled whole table"
    );

    Ok(NormalizedTable {
        coords: rescaled,
        rescaled: true,
    })
}
