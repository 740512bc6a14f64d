//! The in-memory dataset the dashboard works on.
//!
//! Loaded once per session and shared read-only. A reload produces a new
//! `Dataset` with a higher `version`; cached views keyed on the old version
//! are never served for it.

use super::loader::{load_csv, DataLoadError, LoadOptions};
use crate::synthetic::{self, SyntheticSpec};
use crate::types::{Column, FilterDomain, SensorRecord, TableShape};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where the records came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DatasetSource {
    File { path: PathBuf },
    Synthetic { spec: SyntheticSpec },
    /// Records handed over directly by the caller.
    Memory,
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { path } => write!(f, "{}", path.display()),
            Self::Synthetic { spec } => write!(f, "synthetic(seed={})", spec.seed),
            Self::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    version: u64,
    source: DatasetSource,
    /// Column order for tables and exports.
    columns: Vec<Column>,
    records: Vec<SensorRecord>,
    domain: FilterDomain,
    loaded_at: DateTime<Utc>,
    skipped_rows: usize,
}

impl Dataset {
    fn build(
        version: u64,
        source: DatasetSource,
        columns: Vec<Column>,
        records: Vec<SensorRecord>,
        skipped_rows: usize,
    ) -> Self {
        let domain = FilterDomain::from_records(&records);
        Self {
            version,
            source,
            columns,
            records,
            domain,
            loaded_at: Utc::now(),
            skipped_rows,
        }
    }

    /// Read a CSV file as version 1.
    pub fn load(path: &Path, options: LoadOptions) -> Result<Self, DataLoadError> {
        let table = load_csv(path, options)?;
        Ok(Self::build(
            1,
            DatasetSource::File {
                path: path.to_path_buf(),
            },
            table.columns,
            table.records,
            table.skipped_rows,
        ))
    }

    /// Wrap records already in memory, with the canonical column order.
    pub fn from_records(records: Vec<SensorRecord>) -> Self {
        Self::build(1, DatasetSource::Memory, Column::ALL.to_vec(), records, 0)
    }

    pub fn synthetic(spec: SyntheticSpec) -> Self {
        let records = synthetic::generate(&spec);
        Self::build(
            1,
            DatasetSource::Synthetic { spec },
            Column::ALL.to_vec(),
            records,
            0,
        )
    }

    /// Re-read the source into a new dataset one version higher.
    ///
    /// Synthetic sources regenerate from their spec; in-memory datasets keep
    /// their records.
    pub fn reload(&self, options: LoadOptions) -> Result<Self, DataLoadError> {
        let version = self.version + 1;
        let next = match &self.source {
            DatasetSource::File { path } => {
                let table = load_csv(path, options)?;
                Self::build(
                    version,
                    self.source.clone(),
                    table.columns,
                    table.records,
                    table.skipped_rows,
                )
            }
            DatasetSource::Synthetic { spec } => Self::build(
                version,
                self.source.clone(),
                self.columns.clone(),
                synthetic::generate(spec),
                0,
            ),
            DatasetSource::Memory => Self::build(
                version,
                DatasetSource::Memory,
                self.columns.clone(),
                self.records.clone(),
                0,
            ),
        };
        tracing::info!(
            source = %next.source,
            version = next.version,
            records = next.records.len(),
            "Dataset reloaded"
        );
        Ok(next)
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    pub const fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub const fn domain(&self) -> &FilterDomain {
        &self.domain
    }

    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub const fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn shape(&self) -> TableShape {
        TableShape {
            rows: self.records.len(),
            columns: self.columns.len(),
        }
    }
}
