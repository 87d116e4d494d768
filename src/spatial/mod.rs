//! Spatial association between residences, stops and route geometry.
//!
//! Coordinates are normalized and projected into a planar CRS before any
//! distance is measured. [`SpatialContext`] is the immutable snapshot every
//! per-route computation reads from.

pub mod associate;
pub mod coverage;
pub mod crs;
pub mod normalize;

use tracing::{info, warn};

use crate::config::PlanarCrs;
use crate::error::IqtError;
use crate::model::{Association, CrsTag, GeoCoord, Residence, Stop};
use associate::{StopIndex, nearest_stop_for_each_residence};
use crs::Projector;
use normalize::normalize_table;

/// Normalized, projected stops and residences plus the residence→stop associations.
#[derive(Debug)]
pub struct SpatialContext {
    pub projector: Projector,
    pub stops: Vec<Stop>,
    pub residences: Vec<Residence>,
    pub index: StopIndex,
    pub associations: Vec<Association>,
}

fn mean_center(coords: &[GeoCoord]) -> Option<GeoCoord> {
    if coords.is_empty() {
        return None;
    }
    let n = coords.len() as f64;
    let (lat, lon) = coords
        .iter()
        .fold((0.0, 0.0), |(lat, lon), c| (lat + c.latitude, lon + c.longitude));
    Some(GeoCoord::new(lat / n, lon / n))
}

fn normalize_or_empty(table: &str, coords: &[GeoCoord], prescale_factor: f64) -> Vec<GeoCoord> {
    match normalize_table(table, coords, prescale_factor) {
        Ok(normalized) => normalized.coords,
        Err(e) => {
            warn!(table, error = %e, "Coordinate table rejected, continuing with an empty table");
            Vec::new()
        }
    }
}

impl SpatialContext {
    /// Normalizes both tables, projects them and associates every residence
    /// with its nearest stop.
    ///
    /// A table that cannot be normalized is replaced by an empty one, so its
    /// routes report missing coverage instead of aborting the batch.
    #[tracing::instrument(skip_all, fields(stops = raw_stops.len(), residences = raw_residences.len()))]
    pub fn build(
        raw_stops: &[GeoCoord],
        raw_residences: &[GeoCoord],
        crs: PlanarCrs,
        prescale_factor: f64,
    ) -> Result<Self, IqtError> {
        let stops_geo = normalize_or_empty("stops", raw_stops, prescale_factor);
        let residences_geo = normalize_or_empty("residences", raw_residences, prescale_factor);

        let center = mean_center(&stops_geo);
        let crs = match (crs, center) {
            (PlanarCrs::Auto, None) => {
                warn!("No stops to centre an automatic UTM zone on, using the default zone");
                PlanarCrs::default()
            }
            (crs, _) => crs,
        };
        let projector = Projector::new(crs, center)?;
        let (zone, south) = projector.zone();
        info!(zone, south, "Projecting into UTM");

        let stops: Vec<Stop> = projector
            .project_points(&stops_geo)?
            .into_iter()
            .enumerate()
            .map(|(id, location)| Stop {
                id,
                location,
                crs: CrsTag::Planar,
            })
            .collect();

        let residences: Vec<Residence> = residences_geo
            .iter()
            .zip(projector.project_points(&residences_geo)?)
            .enumerate()
            .map(|(id, (raw, location))| Residence {
                id,
                raw: *raw,
                location,
            })
            .collect();

        Ok(Self::from_planar(projector, stops, residences))
    }

    /// Builds the context from stops and residences already in planar metres.
    pub fn from_planar(projector: Projector, stops: Vec<Stop>, residences: Vec<Residence>) -> Self {
        let index = StopIndex::new(&stops);
        if index.is_empty() {
            warn!("No stops available, every route will report missing coverage");
        }
        let associations = nearest_stop_for_each_residence(&index, &residences);
        info!(
            stops = stops.len(),
            residences = residences.len(),
            associations = associations.len(),
            "Residences associated with nearest stops"
        );

        Self {
            projector,
            stops,
            residences,
            index,
            associations,
        }
    }

    /// Geographic position of a stop, for display.
    pub fn stop_position(&self, stop_id: usize) -> Result<Option<GeoCoord>, IqtError> {
        self.stops
            .get(stop_id)
            .map(|s| match s.crs {
                CrsTag::Planar => self.projector.to_geographic(s.location),
                CrsTag::Geographic => Ok(GeoCoord::new(s.location.y, s.location.x)),
            })
            .transpose()
    }
}
