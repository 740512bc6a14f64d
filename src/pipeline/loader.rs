//! CSV ingestion of the cleaned machine dataset.
//!
//! The header row is mapped to [`Column`]s by name, so the file may order its
//! columns freely and carry extra ones (ignored). Every required column must
//! be present; all missing names are reported at once.

use crate::types::{parse_timestamp, Column, Flag, SensorRecord};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to produce a record set from the input source.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV header: {0}")]
    Header(#[source] csv::Error),

    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Line {line}: {message}")]
    InvalidRow { line: u64, message: String },
}

/// Loader behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip malformed rows with a warning instead of failing the load.
    pub skip_invalid_rows: bool,
}

/// Records as read, plus the header order of the known columns.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub columns: Vec<Column>,
    pub records: Vec<SensorRecord>,
    pub skipped_rows: usize,
}

// ============================================================================
// Column mapping
// ============================================================================

/// Header position of every known column.
#[derive(Debug, Clone, Default)]
struct ColumnMap {
    index: [Option<usize>; Column::ALL.len()],
    /// Known columns in header order.
    order: Vec<Column>,
}

impl ColumnMap {
    fn from_header(header: &csv::StringRecord) -> Result<Self, DataLoadError> {
        let mut map = Self::default();
        for (idx, name) in header.iter().enumerate() {
            if let Ok(column) = name.parse::<Column>() {
                let slot = &mut map.index[column as usize];
                if slot.is_none() {
                    *slot = Some(idx);
                    map.order.push(column);
                }
            }
        }

        let missing: Vec<String> = Column::ALL
            .into_iter()
            .filter(|c| map.index[*c as usize].is_none())
            .map(|c| c.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(map)
        } else {
            Err(DataLoadError::MissingColumns { missing })
        }
    }

    fn field<'r>(&self, row: &'r csv::StringRecord, column: Column) -> &'r str {
        self.index[column as usize]
            .and_then(|idx| row.get(idx))
            .unwrap_or("")
            .trim()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load the dataset from a CSV file.
pub fn load_csv(path: &Path, options: LoadOptions) -> Result<LoadedTable, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_csv(file, options)?;
    tracing::info!(
        path = %path.display(),
        records = table.records.len(),
        skipped = table.skipped_rows,
        "Loaded sensor records from CSV"
    );
    Ok(table)
}

/// Read the dataset from any CSV byte source.
pub fn read_csv<R: Read>(reader: R, options: LoadOptions) -> Result<LoadedTable, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = reader.headers().map_err(DataLoadError::Header)?.clone();
    let map = ColumnMap::from_header(&header)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let parsed = result
            .map_err(|e| DataLoadError::InvalidRow {
                line: e.position().map_or(0, csv::Position::line),
                message: e.to_string(),
            })
            .and_then(|row| {
                let line = row.position().map_or(0, csv::Position::line);
                parse_row(&row, &map).map_err(|message| DataLoadError::InvalidRow { line, message })
            });

        match parsed {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) if options.skip_invalid_rows => {
                if skipped < 10 {
                    tracing::warn!(error = %e, "Skipping invalid CSV row");
                }
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if skipped >= 10 {
        tracing::warn!(skipped, "Further invalid rows skipped without logging");
    }

    Ok(LoadedTable {
        columns: map.order,
        records,
        skipped_rows: skipped,
    })
}

/// Parse one data row. Blank lines yield `None`.
fn parse_row(row: &csv::StringRecord, map: &ColumnMap) -> Result<Option<SensorRecord>, String> {
    if row.iter().all(|field| field.trim().is_empty()) {
        return Ok(None);
    }

    let timestamp = map.field(row, Column::Timestamp);
    let datetime = parse_timestamp(timestamp)?;
    let flag = |column: Column| {
        map.field(row, column)
            .parse::<Flag>()
            .map_err(|e| format!("{}: {e}", column.name()))
    };
    let reading = |column: Column| parse_reading(map.field(row, column), column);

    Ok(Some(SensorRecord {
        timestamp: timestamp.to_string(),
        datetime,
        machine: map.field(row, Column::Machine).to_string(),
        machine_status: map.field(row, Column::MachineStatus).to_string(),
        failure_type: map.field(row, Column::FailureType).to_string(),
        anomaly_flag: flag(Column::AnomalyFlag)?,
        maintenance_required: flag(Column::MaintenanceRequired)?,
        temperature: reading(Column::Temperature)?,
        vibration: reading(Column::Vibration)?,
        pressure: reading(Column::Pressure)?,
        energy_consumption: reading(Column::EnergyConsumption)?,
        humidity: reading(Column::Humidity)?,
    }))
}

/// An empty cell is a missing reading (NaN).
fn parse_reading(s: &str, column: Column) -> Result<f64, String> {
    if s.is_empty() {
        return Ok(f64::NAN);
    }
    s.parse::<f64>()
        .map_err(|_| format!("Cannot parse {} as a number: '{s}'", column.name()))
}
