//! End-to-end batch: tables in, one [`RouteReport`] per route out.

use std::collections::BTreeSet;

use geo::{Euclidean, Length};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::IqtConfig;
use crate::error::IqtError;
use crate::metrics::{TableMetrics, completion_ratio};
use crate::model::{GeoCoord, Route, RouteAttributes};
use crate::parser::parse_route_geometry;
use crate::scoring::aggregate::{Weights, score_route};
use crate::scoring::grade::{FarePolicy, IntegrationLevel, OnlineInfo};
use crate::scoring::types::{RouteMetrics, RouteReport, ServedStop};
use crate::spatial::SpatialContext;
use crate::spatial::associate::served_stops;
use crate::spatial::coverage::{Coverage, RouteCoverage, route_coverage};
use crate::spatial::crs::Projector;
use crate::tables::{CompletionRow, FrequencyRow, PunctualityRow, RouteRow};

/// Static snapshot of every input table.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub routes: Vec<RouteRow>,
    pub stops: Vec<GeoCoord>,
    pub residences: Vec<GeoCoord>,
    pub frequency: Vec<FrequencyRow>,
    pub punctuality: Vec<PunctualityRow>,
    pub completion: Vec<CompletionRow>,
}

impl RouteAttributes {
    pub fn from_row(row: &RouteRow) -> Self {
        Self {
            paved_fraction: row.paved_fraction,
            integration: row
                .integration
                .as_deref()
                .map(IntegrationLevel::parse)
                .unwrap_or_default(),
            driver_training: row.driver_training,
            online_info: row.online_info.as_deref().map(OnlineInfo::parse).unwrap_or_default(),
            fare_policy: row.fare_policy.as_deref().map(FarePolicy::parse).unwrap_or_default(),
        }
    }
}

fn build_route(row: &RouteRow, projector: &Projector) -> Result<Route, IqtError> {
    let geometry = parse_route_geometry(&row.route_id, &row.geometry)?;
    let planar = projector
        .project_line(&geometry)
        .map_err(|e| IqtError::geometry(&row.route_id, e))?;
    let length_km = Euclidean.length(&planar) / 1000.0;

    Ok(Route {
        id: row.route_id.clone(),
        geometry,
        planar,
        length_km,
        attributes: RouteAttributes::from_row(row),
    })
}

/// Parses and projects every route row. Malformed routes are skipped with a warning.
///
/// # Errors
///
/// Returns [`IqtError::EmptyRouteTable`] when no route survives.
pub fn build_routes(rows: &[RouteRow], projector: &Projector) -> Result<Vec<Route>, IqtError> {
    let mut routes = Vec::with_capacity(rows.len());
    for row in rows {
        match build_route(row, projector) {
            Ok(route) => routes.push(route),
            Err(e) => warn!(route_id = %row.route_id, error = %e, "Skipping route"),
        }
    }

    if routes.is_empty() {
        return Err(IqtError::EmptyRouteTable);
    }
    Ok(routes)
}

/// Per-route result before display positions are attached.
struct RatedRoute {
    report: RouteReport,
    served: BTreeSet<usize>,
}

fn rate_route(
    route: &Route,
    coverage: RouteCoverage,
    served: BTreeSet<usize>,
    tables: &TableMetrics,
    weights: &Weights,
) -> RatedRoute {
    if let Coverage::Missing { reason } = &coverage.coverage {
        warn!(route_id = %route.id, %reason, "Coverage missing for route");
    }

    let metrics = RouteMetrics {
        paved_fraction: route.attributes.paved_fraction,
        mean_distance_m: coverage.coverage.mean_distance_m(),
        punctuality: tables.punctuality.get(&route.id).copied(),
        headway_min: tables.headway_min.get(&route.id).copied(),
        coverage_proportion: coverage.coverage.proportion(),
        driver_training: route.attributes.driver_training,
        completion_ratio: completion_ratio(tables.executed_km.get(&route.id).copied(), route.length_km),
    };

    let score = score_route(&route.id, &metrics, &route.attributes, weights);
    let [i1, i2, i3, i4, i5, i6, i7, i8, i9, i10] = score.scores;

    RatedRoute {
        report: RouteReport {
            route_id: route.id.clone(),
            i1,
            i2,
            i3,
            i4,
            i5,
            i6,
            i7,
            i8,
            i9,
            i10,
            iqt: score.iqt,
            class: score.class,
            color: score.color,
            length_km: route.length_km,
            mean_distance_m: metrics.mean_distance_m,
            coverage_proportion: metrics.coverage_proportion,
            punctuality: metrics.punctuality,
            headway_min: metrics.headway_min,
            completion_ratio: metrics.completion_ratio,
            served_stops: Vec::new(),
        },
        served,
    }
}

/// Rates already-built routes against a spatial context.
///
/// Routes are scored in parallel; the output keeps route order.
pub fn rate_snapshot(
    routes: &[Route],
    ctx: &SpatialContext,
    tables: &TableMetrics,
    weights: &Weights,
    threshold_m: f64,
) -> Result<Vec<RouteReport>, IqtError> {
    let index = &ctx.index;
    let associations = &ctx.associations;

    let rated: Vec<RatedRoute> = routes
        .par_iter()
        .map(|route| {
            let served = served_stops(index, &route.planar);
            let coverage = route_coverage(&route.id, associations, &served, threshold_m);
            rate_route(route, coverage, served, tables, weights)
        })
        .collect();

    rated
        .into_iter()
        .map(|RatedRoute { mut report, served }| -> Result<RouteReport, IqtError> {
            for stop_id in served {
                if let Some(position) = ctx.stop_position(stop_id)? {
                    report.served_stops.push(ServedStop::new(stop_id, position));
                }
            }
            Ok(report)
        })
        .collect()
}

/// Runs the whole batch over one input snapshot.
///
/// # Errors
///
/// Fails on invalid weights, a projection failure, or when no route can be
/// built. Every other problem degrades per table or per route.
#[tracing::instrument(skip_all, fields(routes = inputs.routes.len()))]
pub fn rate_routes(inputs: &Inputs, config: &IqtConfig) -> Result<Vec<RouteReport>, IqtError> {
    let weights = Weights::new(&config.weights)?;
    let ctx = SpatialContext::build(
        &inputs.stops,
        &inputs.residences,
        config.planar_crs,
        config.prescale_factor,
    )?;
    let routes = build_routes(&inputs.routes, &ctx.projector)?;
    let tables = TableMetrics::from_tables(&inputs.frequency, &inputs.punctuality, &inputs.completion);

    let reports = rate_snapshot(&routes, &ctx, &tables, &weights, config.coverage_threshold_m)?;

    info!(
        rated = reports.len(),
        skipped = inputs.routes.len() - routes.len(),
        "Routes rated"
    );
    Ok(reports)
}
