//! Table projection and CSV download.
//!
//! The export has a header row of the selected column names and no index
//! column, so it loads back through the CSV loader when every required
//! column is selected.

use crate::types::{Column, InvalidColumnError, SensorRecord};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Columns shown in the table and written to the export, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSelection {
    columns: Vec<Column>,
}

impl ColumnSelection {
    /// Keep `columns` in order, dropping repeats.
    pub fn new<I: IntoIterator<Item = Column>>(columns: I) -> Self {
        let mut selected: Vec<Column> = Vec::new();
        for column in columns {
            if !selected.contains(&column) {
                selected.push(column);
            }
        }
        Self { columns: selected }
    }

    pub fn all(columns: &[Column]) -> Self {
        Self::new(columns.iter().copied())
    }

    /// Parse a comma-separated list of column names. Blank input selects no
    /// columns; any unknown name fails the whole list.
    pub fn parse(list: &str) -> Result<Self, InvalidColumnError> {
        let columns = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse::<Column>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(columns))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Write `records` projected on `selection` as CSV.
///
/// With no columns selected nothing is written, not even a header.
pub fn write_csv<'a, W, I>(writer: W, records: I, selection: &ColumnSelection) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a SensorRecord>,
{
    if selection.is_empty() {
        return Ok(0);
    }

    let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(selection.columns().iter().map(|c| c.name()))?;

    let mut rows = 0;
    for record in records {
        csv.write_record(selection.columns().iter().map(|&c| record.field_text(c)))?;
        rows += 1;
    }
    csv.flush()?;
    Ok(rows)
}

/// UTF-8 CSV bytes of the projected rows.
pub fn to_csv_bytes<'a, I>(records: I, selection: &ColumnSelection) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = &'a SensorRecord>,
{
    let mut buf = Vec::new();
    write_csv(&mut buf, records, selection)?;
    Ok(buf)
}

/// One JSON object per record, holding only the selected columns.
pub fn project_json<'a, I>(records: I, selection: &ColumnSelection) -> Vec<serde_json::Map<String, serde_json::Value>>
where
    I: IntoIterator<Item = &'a SensorRecord>,
{
    records
        .into_iter()
        .map(|record| {
            selection
                .columns()
                .iter()
                .map(|&c| (c.name().to_string(), record.field_json(c)))
                .collect()
        })
        .collect()
}
