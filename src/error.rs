//! Error taxonomy for the rating pipeline.
//!
//! Only [`IqtError::EmptyRouteTable`] aborts a batch once it has started.
//! Every other data error is recovered per table or per route by the
//! pipeline and logged. [`IqtError::InvalidWeights`] is rejected before any
//! table is read.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IqtError {
    /// A required column is missing or has the wrong type.
    #[error("schema validation failed for {table} table: {reason}")]
    SchemaValidation { table: String, reason: String },

    /// A route polyline could not be parsed or is degenerate.
    #[error("malformed geometry for route {route_id}: {reason}")]
    Geometry { route_id: String, reason: String },

    /// Coordinates are still outside geographic bounds after rescaling.
    #[error(
        "coordinates in {table} table out of bounds after rescaling \
         (max |lat| = {max_abs_latitude}, max |lon| = {max_abs_longitude})"
    )]
    CoordinatesOutOfBounds {
        table: String,
        max_abs_latitude: f64,
        max_abs_longitude: f64,
    },

    #[error("projection failed: {0}")]
    Projection(String),

    #[error("invalid indicator weights: {0}")]
    InvalidWeights(String),

    #[error("route table is empty or has no usable routes")]
    EmptyRouteTable,
}

impl IqtError {
    pub fn schema(table: &str, reason: impl ToString) -> Self {
        IqtError::SchemaValidation {
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn geometry(route_id: &str, reason: impl ToString) -> Self {
        IqtError::Geometry {
            route_id: route_id.to_string(),
            reason: reason.to_string(),
        }
    }
}
