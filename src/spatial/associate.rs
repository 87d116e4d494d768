use std::collections::BTreeSet;

use geo::{Coord, LineString};
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree};

use crate::model::{Association, Residence, Stop};

type StopEntry = GeomWithData<[f64; 2], usize>;

/// R-tree over planar stop locations, keyed by stop index.
#[derive(Debug, Clone)]
pub struct StopIndex {
    tree: RTree<StopEntry>,
}

impl StopIndex {
    pub fn new(stops: &[Stop]) -> Self {
        Self {
            tree: RTree::bulk_load(
                stops
                    .iter()
                    .map(|s| GeomWithData::new([s.location.x, s.location.y], s.id))
                    .collect(),
            ),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nearest stop to `point` and its distance in metres.
    ///
    /// Equidistant stops resolve to the lowest index, so the result matches
    /// a brute-force arg-min scan over the stop table.
    pub fn nearest(&self, point: Coord<f64>) -> Option<(usize, f64)> {
        let query = [point.x, point.y];
        let mut candidates = self.tree.nearest_neighbor_iter(&query);

        let first = candidates.next()?;
        let best_d2 = first.distance_2(&query);
        let mut best_id = first.data;

        for entry in candidates {
            if entry.distance_2(&query) > best_d2 {
                break;
            }
            best_id = best_id.min(entry.data);
        }

        Some((best_id, best_d2.sqrt()))
    }
}

/// Nearest stop for every residence, in residence order.
///
/// Residences are matched in parallel. Returns an empty list when there are no stops.
pub fn nearest_stop_for_each_residence(index: &StopIndex, residences: &[Residence]) -> Vec<Association> {
    residences
        .par_iter()
        .filter_map(|r| {
            index.nearest(r.location).map(|(stop_id, distance_m)| Association {
                residence_id: r.id,
                stop_id,
                distance_m,
            })
        })
        .collect()
}

/// Nearest stop to each vertex of a planar route polyline, in vertex order.
pub fn nearest_stop_for_each_vertex(index: &StopIndex, route: &LineString<f64>) -> Vec<usize> {
    route
        .coords()
        .filter_map(|c| index.nearest(*c).map(|(stop_id, _)| stop_id))
        .collect()
}

/// Deduplicated set of stops served by a route: every stop that is nearest to
/// at least one of its vertices.
pub fn served_stops(index: &StopIndex, route: &LineString<f64>) -> BTreeSet<usize> {
    nearest_stop_for_each_vertex(index, route).into_iter().collect()
}
