//! Row types and CSV loading for the tabular inputs.
//!
//! Column names are snake_case; the aliases accept the headers of the
//! operator spreadsheets the tables are usually exported from.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::IqtError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteRow {
    #[serde(alias = "linha")]
    pub route_id: String,
    /// WKT `LINESTRING` in WGS84 degrees.
    pub geometry: String,
    #[serde(default, alias = "via_pavimentada")]
    pub paved_fraction: Option<f64>,
    #[serde(default, alias = "integracao")]
    pub integration: Option<String>,
    #[serde(default, alias = "treinamento_motorista")]
    pub driver_training: Option<f64>,
    #[serde(default, alias = "informacao_internet")]
    pub online_info: Option<String>,
    #[serde(default, alias = "valor_tarifa")]
    pub fare_policy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrequencyRow {
    #[serde(alias = "linha")]
    pub route_id: String,
    /// `%H:%M:%S`
    #[serde(alias = "hsstart")]
    pub start_time: String,
    #[serde(alias = "hsstop")]
    pub stop_time: String,
    /// `%d/%m/%Y`
    #[serde(alias = "data")]
    pub date: String,
    #[serde(alias = "dataf")]
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PunctualityRow {
    #[serde(alias = "Trajeto")]
    pub trip_label: String,
    #[serde(default, alias = "Chegada ao ponto")]
    pub arrival_at_stop: Option<String>,
    #[serde(default, alias = "Partida Real")]
    pub actual_departure: Option<String>,
    #[serde(default, alias = "Chegada Real")]
    pub actual_arrival: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionRow {
    #[serde(alias = "Trajeto")]
    pub trip_label: String,
    #[serde(default, alias = "KM Executado")]
    pub executed_km: Option<String>,
}

/// Deserializes every row of a CSV table.
///
/// # Errors
///
/// Returns [`IqtError::SchemaValidation`] naming the first row that is
/// missing a required column or holds a value of the wrong type.
pub fn read_table<T: DeserializeOwned, R: Read>(table: &str, reader: R) -> Result<Vec<T>, IqtError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let row: T = result.map_err(|e| IqtError::schema(table, format!("row {}: {e}", i + 1)))?;
        rows.push(row);
    }

    debug!(table, rows = rows.len(), "Table loaded");
    Ok(rows)
}

/// Opens and reads a CSV table from disk.
pub fn load_table<T: DeserializeOwned>(table: &str, path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {table} table at {}", path.display()))?;
    Ok(read_table(table, file)?)
}

/// Like [`load_table`], but a failed load degrades to an empty table.
pub fn load_table_or_empty<T: DeserializeOwned>(table: &str, path: &Path) -> Vec<T> {
    match load_table(table, path) {
        Ok(rows) => rows,
        Err(e) => {
            error!(table, path = %path.display(), error = %format!("{e:#}"), "Table load failed, continuing with empty table");
            Vec::new()
        }
    }
}
