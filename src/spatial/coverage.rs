use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::Association;
use crate::scoring::utility::mean;

/// Why a route has no coverage figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// No stop is nearest to any vertex of the route.
    NoServedStops,
    /// Served stops exist but no residence picked any of them as nearest.
    NoAssociatedResidences,
}

impl std::fmt::Display for MissingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingReason::NoServedStops => f.write_str("no served stops"),
            MissingReason::NoAssociatedResidences => f.write_str("no associated residences"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Coverage {
    Measured {
        mean_distance_m: f64,
        /// Share of associated residences closer than the threshold, in [0, 1].
        proportion: f64,
        residences: usize,
    },
    Missing { reason: MissingReason },
}

impl Coverage {
    pub fn proportion(&self) -> Option<f64> {
        match self {
            Coverage::Measured { proportion, .. } => Some(*proportion),
            Coverage::Missing { .. } => None,
        }
    }

    pub fn mean_distance_m(&self) -> Option<f64> {
        match self {
            Coverage::Measured { mean_distance_m, .. } => Some(*mean_distance_m),
            Coverage::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Coverage::Missing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCoverage {
    pub route_id: String,
    pub coverage: Coverage,
}

/// Coverage of one route by the residences whose nearest stop serves it.
///
/// `proportion` counts distances strictly below `threshold_m`.
pub fn route_coverage(
    route_id: &str,
    associations: &[Association],
    served: &BTreeSet<usize>,
    threshold_m: f64,
) -> RouteCoverage {
    let coverage = if served.is_empty() {
        Coverage::Missing {
            reason: MissingReason::NoServedStops,
        }
    } else {
        let distances: Vec<f64> = associations
            .iter()
            .filter(|a| served.contains(&a.stop_id))
            .map(|a| a.distance_m)
            .collect();

        match mean(&distances) {
            None => Coverage::Missing {
                reason: MissingReason::NoAssociatedResidences,
            },
            Some(mean_distance_m) => {
                let near = distances.iter().filter(|d| **d < threshold_m).count();
                Coverage::Measured {
                    mean_distance_m,
                    proportion: near as f64 / distances.len() as f64,
                    residences: distances.len(),
                }
            }
        }
    };

    RouteCoverage {
        route_id: route_id.to_string(),
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CrsTag, GeoCoord, Residence, Stop};
    use crate::spatial::associate::{StopIndex, nearest_stop_for_each_residence, served_stops};
    use geo::{Coord, LineString};

    fn assoc(residence_id: usize, stop_id: usize, distance_m: f64) -> Association {
        Association {
            residence_id,
            stop_id,
            distance_m,
        }
    }

    #[test]
    fn test_single_stop_single_residence_scenario() {
        // Stop 50 m off the route, residence 50 m from the stop.
        let stops = vec![Stop {
            id: 0,
            location: Coord { x: 0.0, y: 50.0 },
            crs: CrsTag::Planar,
        }];
        let homes = vec![Residence {
            id: 0,
            raw: GeoCoord::new(0.0, 0.0),
            location: Coord { x: 0.0, y: 100.0 },
        }];
        let route = LineString::from(vec![(-200.0, 0.0), (0.0, 0.0), (200.0, 0.0)]);

        let index = StopIndex::new(&stops);
        let associations = nearest_stop_for_each_residence(&index, &homes);
        let served = served_stops(&index, &route);
        let result = route_coverage("01", &associations, &served, 400.0);

        assert_eq!(result.route_id, "01");
        assert_eq!(result.coverage.proportion(), Some(1.0));
        assert_eq!(result.coverage.mean_distance_m(), Some(50.0));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let associations = vec![assoc(0, 0, 399.9), assoc(1, 0, 400.0), assoc(2, 0, 100.0), assoc(3, 0, 800.0)];
        let result = route_coverage("02", &associations, &BTreeSet::from([0]), 400.0);

        assert_eq!(result.coverage.proportion(), Some(0.5));
        assert_eq!(
            result.coverage,
            Coverage::Measured {
                mean_distance_m: (399.9 + 400.0 + 100.0 + 800.0) / 4.0,
                proportion: 0.5,
                residences: 4,
            }
        );
    }

    #[test]
    fn test_only_served_stops_count() {
        let associations = vec![assoc(0, 0, 10.0), assoc(1, 1, 900.0), assoc(2, 2, 30.0)];
        let result = route_coverage("03", &associations, &BTreeSet::from([0, 2]), 400.0);

        assert_eq!(result.coverage.proportion(), Some(1.0));
        assert_eq!(result.coverage.mean_distance_m(), Some(20.0));
    }

    #[test]
    fn test_missing_without_served_stops() {
        let associations = vec![assoc(0, 0, 10.0)];
        let result = route_coverage("04", &associations, &BTreeSet::new(), 400.0);

        assert_eq!(
            result.coverage,
            Coverage::Missing {
                reason: MissingReason::NoServedStops
            }
        );
    }

    #[test]
    fn test_missing_without_associated_residences() {
        let associations = vec![assoc(0, 5, 10.0)];
        let result = route_coverage("05", &associations, &BTreeSet::from([1]), 400.0);

        assert!(result.coverage.is_missing());
        assert_eq!(result.coverage.proportion(), None);
        assert_eq!(result.coverage.mean_distance_m(), None);
    }

    #[test]
    fn test_proportion_stays_in_unit_interval() {
        let associations: Vec<Association> = (0..50).map(|i| assoc(i, i % 3, i as f64 * 20.0)).collect();
        for threshold in [0.0, 1.0, 250.0, 400.0, 10_000.0] {
            let p = route_coverage("06", &associations, &BTreeSet::from([0, 1, 2]), threshold)
                .coverage
                .proportion()
                .unwrap();
            assert!((0.0..=1.0).contains(&p), "threshold {threshold} gave {p}");
        }
    }
}
