use std::path::{Path, PathBuf};

use iqt_rater::config::IqtConfig;
use iqt_rater::error::IqtError;
use iqt_rater::output::{write_reports_csv, write_reports_json};
use iqt_rater::pipeline::{Inputs, rate_routes};
use iqt_rater::scoring::types::{IqtClass, RouteReport};
use iqt_rater::tables::{RouteRow, load_table};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_inputs() -> Inputs {
    Inputs {
        routes: load_table("routes", &fixture("routes.csv")).expect("routes fixture"),
        stops: load_table("stops", &fixture("stops.csv")).expect("stops fixture"),
        residences: load_table("residences", &fixture("residences.csv")).expect("residences fixture"),
        frequency: load_table("frequency", &fixture("frequency.csv")).expect("frequency fixture"),
        punctuality: load_table("punctuality", &fixture("punctuality.csv"))
            .expect("punctuality fixture"),
        completion: load_table("completion", &fixture("completion.csv")).expect("completion fixture"),
    }
}

fn by_id<'a>(reports: &'a [RouteReport], id: &str) -> &'a RouteReport {
    reports
        .iter()
        .find(|r| r.route_id == id)
        .unwrap_or_else(|| panic!("no report for route {id}"))
}

#[test]
fn test_full_pipeline() {
    let reports = rate_routes(&fixture_inputs(), &IqtConfig::default()).expect("batch should run");

    // Route 303 has a single vertex and is skipped.
    let ids: Vec<_> = reports.iter().map(|r| r.route_id.as_str()).collect();
    assert_eq!(ids, vec!["101", "202", "404"]);

    for report in &reports {
        assert!(report.scores().iter().all(|s| *s <= 3), "{report:?}");
        if let Some(p) = report.coverage_proportion {
            assert!((0.0..=1.0).contains(&p));
        }
    }
}

#[test]
fn test_well_served_route_is_excellent() {
    let reports = rate_routes(&fixture_inputs(), &IqtConfig::default()).unwrap();
    let route = by_id(&reports, "101");

    // Residences 55 m and 110 m from the two stops serving the route.
    let mean = route.mean_distance_m.unwrap();
    assert!((mean - 83.0).abs() < 2.0, "mean distance {mean}");
    assert_eq!(route.coverage_proportion, Some(1.0));
    assert_eq!(route.punctuality, Some(1.0));
    assert_eq!(route.headway_min, Some(8.0));
    assert_eq!(route.scores(), [3, 3, 3, 3, 3, 3, 3, 3, 3, 3]);
    assert_eq!(route.class, IqtClass::Excellent);
    assert_eq!(route.served_stops.len(), 2);

    assert!((route.length_km - 1.046).abs() < 0.01, "length {}", route.length_km);
    let completion = route.completion_ratio.unwrap();
    assert!(completion > 0.9 && completion < 1.0, "completion {completion}");
}

#[test]
fn test_poorly_served_route_is_insufficient() {
    let reports = rate_routes(&fixture_inputs(), &IqtConfig::default()).unwrap();
    let route = by_id(&reports, "202");

    // One residence on the stop, one far beyond the threshold.
    assert_eq!(route.coverage_proportion, Some(0.5));
    assert_eq!(route.punctuality, Some(0.5));
    assert_eq!(route.headway_min, Some(30.0));
    assert_eq!(route.completion_ratio, None);
    assert_eq!(route.scores(), [0, 0, 0, 0, 1, 0, 0, 0, 0, 0]);
    assert_eq!(route.class, IqtClass::Insufficient);
}

#[test]
fn test_route_without_service_tables() {
    let reports = rate_routes(&fixture_inputs(), &IqtConfig::default()).unwrap();
    let route = by_id(&reports, "404");

    assert_eq!(route.coverage_proportion, Some(1.0));
    assert_eq!(route.punctuality, None);
    assert_eq!(route.headway_min, None);
    assert_eq!((route.i1, route.i2, route.i3, route.i7), (2, 2, 1, 3));
    assert_eq!(route.class, IqtClass::Sufficient);
}

#[test]
fn test_threshold_override_tightens_coverage() {
    let config = IqtConfig {
        coverage_threshold_m: 100.0,
        ..Default::default()
    };
    let reports = rate_routes(&fixture_inputs(), &config).unwrap();

    assert_eq!(by_id(&reports, "101").coverage_proportion, Some(0.5));
    assert_eq!(by_id(&reports, "101").i7, 0);
    assert_eq!(by_id(&reports, "404").coverage_proportion, Some(0.0));
}

#[test]
fn test_missing_optional_tables_score_zero() {
    let inputs = Inputs {
        frequency: Vec::new(),
        punctuality: Vec::new(),
        completion: Vec::new(),
        ..fixture_inputs()
    };
    let reports = rate_routes(&inputs, &IqtConfig::default()).unwrap();
    let route = by_id(&reports, "101");

    assert_eq!((route.i4, route.i5), (0, 0));
    assert_eq!(route.completion_ratio, None);
    assert!(route.iqt < by_id(&rate_routes(&fixture_inputs(), &IqtConfig::default()).unwrap(), "101").iqt);
}

#[test]
fn test_reports_are_deterministic() {
    let inputs = fixture_inputs();
    let config = IqtConfig::default();

    let first = rate_routes(&inputs, &config).unwrap();
    let second = rate_routes(&inputs, &config).unwrap();

    assert_eq!(first, second);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.iqt.to_bits(), b.iqt.to_bits());
    }
}

#[test]
fn test_only_malformed_routes_aborts() {
    let inputs = Inputs {
        routes: vec![RouteRow {
            route_id: "303".to_string(),
            geometry: "LINESTRING (-43.9000 -19.9000)".to_string(),
            paved_fraction: None,
            integration: None,
            driver_training: None,
            online_info: None,
            fare_policy: None,
        }],
        ..fixture_inputs()
    };

    let err = rate_routes(&inputs, &IqtConfig::default()).unwrap_err();
    assert_eq!(err, IqtError::EmptyRouteTable);
}

#[test]
fn test_exports() {
    let reports = rate_routes(&fixture_inputs(), &IqtConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("iqt.csv");
    let json_path = dir.path().join("iqt.json");

    write_reports_csv(&csv_path, &reports).unwrap();
    write_reports_json(&json_path, &reports).unwrap();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 4);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(3));
    assert_eq!(json[0]["served_stops"].as_array().map(Vec::len), Some(2));
    let latitude = json[0]["served_stops"][0]["latitude"].as_f64().unwrap();
    assert!((latitude - -19.92).abs() < 1e-6);
}
