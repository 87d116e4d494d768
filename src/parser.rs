//! Parsers for the encoded text fields in the input tables.

use std::sync::LazyLock;

use geo::LineString;
use regex::Regex;
use serde::Serialize;
use wkt::TryFromWkt;

use crate::error::IqtError;

/// `"<route digits> - <route name> (ida|volta)"`, e.g. `"5201 - Estação / Centro (ida)"`.
static TRIP_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*.*\((ida|volta)\)").expect("valid trip label regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripLabel {
    pub route_id: String,
    pub direction: Direction,
}

/// Splits a trip label into route id and direction. Returns `None` when the
/// label does not follow the `"<id> - <name> (ida|volta)"` convention.
pub fn parse_trip_label(label: &str) -> Option<TripLabel> {
    let caps = TRIP_LABEL.captures(label)?;
    let direction = match &caps[2] {
        "ida" => Direction::Outbound,
        _ => Direction::Inbound,
    };
    Some(TripLabel {
        route_id: caps[1].to_string(),
        direction,
    })
}

/// Parses a WKT `LINESTRING` in WGS84 degrees. Z/M ordinates are dropped.
///
/// # Errors
///
/// Returns [`IqtError::Geometry`] for non-linestring WKT, fewer than two
/// vertices, or vertices outside geographic bounds.
pub fn parse_route_geometry(route_id: &str, text: &str) -> Result<LineString<f64>, IqtError> {
    let text = text.trim();
    if !text.to_ascii_uppercase().starts_with("LINESTRING") {
        return Err(IqtError::geometry(route_id, "geometry is not a WKT LINESTRING"));
    }

    let line = LineString::<f64>::try_from_wkt_str(text)
        .map_err(|e| IqtError::geometry(route_id, e))?;

    if line.0.len() < 2 {
        return Err(IqtError::geometry(
            route_id,
            format!("linestring has {} vertices, need at least 2", line.0.len()),
        ));
    }

    if let Some(c) = line
        .coords()
        .find(|c| !(c.x.is_finite() && c.y.is_finite() && c.x.abs() <= 180.0 && c.y.abs() <= 90.0))
    {
        return Err(IqtError::geometry(
            route_id,
            format!("vertex ({}, {}) is not a WGS84 lon/lat pair", c.x, c.y),
        ));
    }

    Ok(line)
}
