//! Output formatting and persistence for route reports.
//!
//! Supports pretty-printing, JSON serialization, and CSV export.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::scoring::types::{IqtClass, RouteReport, RouteReportJson};
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Logs every report using Rust's debug pretty-print format.
pub fn print_pretty(reports: &[RouteReport]) {
    for report in reports {
        debug!("{:#?}", report);
    }
}

/// Logs the reports as pretty-printed JSON, served stops included.
pub fn print_json(reports: &[RouteReport]) -> Result<()> {
    let json: Vec<RouteReportJson> = reports.iter().map(RouteReportJson::from).collect();
    info!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Logs one line per route plus the class distribution.
pub fn print_summary(reports: &[RouteReport]) {
    for report in reports {
        info!(
            route_id = %report.route_id,
            iqt = report.iqt,
            class = %report.class,
            scores = ?report.scores(),
            "Route rated"
        );
    }

    let count = |class: IqtClass| reports.iter().filter(|r| r.class == class).count();
    info!(
        excellent = count(IqtClass::Excellent),
        good = count(IqtClass::Good),
        sufficient = count(IqtClass::Sufficient),
        insufficient = count(IqtClass::Insufficient),
        "Class distribution"
    );
}

/// Writes the reports as a CSV table with a header row, replacing any
/// existing file.
pub fn write_reports_csv(path: &Path, reports: &[RouteReport]) -> Result<()> {
    debug!(path = %path.display(), rows = reports.len(), "Writing CSV report");

    let file = File::create(path)
        .with_context(|| format!("failed to create CSV report at {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for report in reports {
        writer.serialize(report)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the reports as a JSON array with served stop positions.
pub fn write_reports_json(path: &Path, reports: &[RouteReport]) -> Result<()> {
    debug!(path = %path.display(), rows = reports.len(), "Writing JSON report");

    let file = File::create(path)
        .with_context(|| format!("failed to create JSON report at {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let json: Vec<RouteReportJson> = reports.iter().map(RouteReportJson::from).collect();
    serde_json::to_writer_pretty(&mut writer, &json)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}
