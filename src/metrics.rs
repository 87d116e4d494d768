//! Per-route operational metrics derived from the service tables.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::parser::parse_trip_label;
use crate::scoring::utility::mean;
use crate::tables::{CompletionRow, FrequencyRow, PunctualityRow};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Placeholder the operator spreadsheets use for an empty cell.
const EMPTY_CELL: &str = "-";

/// Per-route aggregates computed once from the service tables. Routes absent
/// from a table are simply absent from its map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableMetrics {
    pub headway_min: BTreeMap<String, f64>,
    pub punctuality: BTreeMap<String, f64>,
    pub executed_km: BTreeMap<String, f64>,
}

impl TableMetrics {
    pub fn from_tables(
        frequency: &[FrequencyRow],
        punctuality: &[PunctualityRow],
        completion: &[CompletionRow],
    ) -> Self {
        Self {
            headway_min: mean_headway_by_route(frequency),
            punctuality: punctuality_by_route(punctuality),
            executed_km: mean_executed_km_by_route(completion),
        }
    }
}

fn is_present(cell: &Option<String>) -> bool {
    matches!(cell.as_deref().map(str::trim), Some(v) if !v.is_empty() && v != EMPTY_CELL)
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

/// Whole minutes between two clock times. A window ending before it starts
/// is taken to cross midnight.
pub fn service_window_minutes(start: NaiveTime, stop: NaiveTime) -> i64 {
    let minutes = (stop - start).num_minutes();
    if minutes < 0 { minutes + MINUTES_PER_DAY } else { minutes }
}

/// Mean service window per route, in minutes. Rows with unparseable times or
/// dates are skipped.
pub fn mean_headway_by_route(rows: &[FrequencyRow]) -> BTreeMap<String, f64> {
    let mut windows: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let (Some(start), Some(stop)) = (parse_time(&row.start_time), parse_time(&row.stop_time)) else {
            skipped += 1;
            continue;
        };
        if parse_date(&row.date).is_none() || parse_date(&row.end_date).is_none() {
            skipped += 1;
            continue;
        }

        windows
            .entry(row.route_id.clone())
            .or_default()
            .push(service_window_minutes(start, stop) as f64);
    }

    if skipped > 0 {
        warn!(skipped, "Frequency rows with unparseable times or dates skipped");
    }

    windows
        .into_iter()
        .filter_map(|(route, values)| mean(&values).map(|m| (route, m)))
        .collect()
}

/// Share of trips per route with at least one recorded timestamp.
pub fn punctuality_by_route(rows: &[PunctualityRow]) -> BTreeMap<String, f64> {
    // (recorded, total)
    let mut tallies: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut unlabeled = 0usize;

    for row in rows {
        let Some(label) = parse_trip_label(&row.trip_label) else {
            unlabeled += 1;
            continue;
        };

        let recorded = is_present(&row.arrival_at_stop)
            || is_present(&row.actual_departure)
            || is_present(&row.actual_arrival);

        let tally = tallies.entry(label.route_id).or_default();
        tally.1 += 1;
        if recorded {
            tally.0 += 1;
        }
    }

    if unlabeled > 0 {
        debug!(unlabeled, "Punctuality rows with unrecognized trip labels skipped");
    }

    tallies
        .into_iter()
        .map(|(route, (recorded, total))| (route, recorded as f64 / total as f64))
        .collect()
}

/// Mean executed kilometres per route. Blank or non-numeric cells are dropped.
pub fn mean_executed_km_by_route(rows: &[CompletionRow]) -> BTreeMap<String, f64> {
    let mut executed: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for row in rows {
        let Some(label) = parse_trip_label(&row.trip_label) else {
            continue;
        };
        if !is_present(&row.executed_km) {
            continue;
        }
        let Some(km) = row
            .executed_km
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|km| km.is_finite())
        else {
            continue;
        };
        executed.entry(label.route_id).or_default().push(km);
    }

    executed
        .into_iter()
        .filter_map(|(route, values)| mean(&values).map(|m| (route, m)))
        .collect()
}

/// Executed distance over geometric route length.
pub fn completion_ratio(executed_km: Option<f64>, length_km: f64) -> Option<f64> {
    match executed_km {
        Some(km) if length_km > 0.0 => Some(km / length_km),
        _ => None,
    }
}
