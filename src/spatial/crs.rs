use geo::{Coord, LineString, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::config::PlanarCrs;
use crate::error::IqtError;
use crate::model::GeoCoord;

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// UTM zone (1..=60) containing `longitude`.
pub fn utm_zone_for(longitude: f64) -> u8 {
    (((longitude + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8
}

fn utm_proj4(zone: u8, south: bool) -> String {
    let south = if south { " +south" } else { "" };
    format!("+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs")
}

/// Converts between WGS84 degrees and a planar UTM CRS in metres.
pub struct Projector {
    geographic: Proj4,
    planar: Proj4,
    zone: u8,
    south: bool,
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector")
            .field("zone", &self.zone)
            .field("south", &self.south)
            .finish()
    }
}

impl Projector {
    /// Builds a projector for `crs`. `Auto` picks the UTM zone containing `center`.
    pub fn new(crs: PlanarCrs, center: Option<GeoCoord>) -> Result<Self, IqtError> {
        let (zone, south) = match crs {
            PlanarCrs::Utm { zone, south } => (zone, south),
            PlanarCrs::Auto => {
                let center = center.ok_or_else(|| {
                    IqtError::Projection("automatic UTM zone needs at least one stop".into())
                })?;
                (utm_zone_for(center.longitude), center.latitude < 0.0)
            }
        };

        let geographic = Proj4::from_proj_string(WGS84_PROJ4).map_err(|e| {
            IqtError::Projection(format!("failed to build source PROJ.4 {WGS84_PROJ4}: {e}"))
        })?;

        let proj_string = utm_proj4(zone, south);
        let planar = Proj4::from_proj_string(&proj_string).map_err(|e| {
            IqtError::Projection(format!("failed to build target PROJ.4 {proj_string}: {e}"))
        })?;

        Ok(Self {
            geographic,
            planar,
            zone,
            south,
        })
    }

    pub fn zone(&self) -> (u8, bool) {
        (self.zone, self.south)
    }

    /// Degrees in, metres out. `coord.x` is longitude.
    pub fn to_planar(&self, coord: Coord<f64>) -> Result<Coord<f64>, IqtError> {
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(&self.geographic, &self.planar, &mut point)
            .map_err(|e| IqtError::Projection(format!("({}, {}): {e}", coord.x, coord.y)))?;
        Ok(Coord {
            x: point.0,
            y: point.1,
        })
    }

    /// Metres in, degrees out. Only used for display.
    pub fn to_geographic(&self, coord: Coord<f64>) -> Result<GeoCoord, IqtError> {
        let mut point = (coord.x, coord.y, 0.0);
        transform(&self.planar, &self.geographic, &mut point)
            .map_err(|e| IqtError::Projection(format!("({}, {}): {e}", coord.x, coord.y)))?;
        Ok(GeoCoord::new(point.1.to_degrees(), point.0.to_degrees()))
    }

    pub fn project_points(&self, coords: &[GeoCoord]) -> Result<Vec<Coord<f64>>, IqtError> {
        coords.iter().map(|c| self.to_planar(c.to_coord())).collect()
    }

    pub fn project_line(&self, line: &LineString<f64>) -> Result<LineString<f64>, IqtError> {
        line.try_map_coords(|coord| self.to_planar(coord))
    }
}
