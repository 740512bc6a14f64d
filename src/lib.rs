//! Machine Sensor Explorer: filter-and-aggregate backend for smart
//! manufacturing sensor data.
//!
//! ## Architecture
//!
//! - **Types**: sensor records, column identifiers, filter criteria, aggregates
//! - **Pipeline**: CSV loading, filtering, aggregation, memoised views
//! - **Export**: column projection and CSV download
//! - **Synthetic**: seeded demo dataset
//! - **API**: Axum HTTP surface for the presentation layer

pub mod api;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod synthetic;
pub mod types;

pub use config::DashboardConfig;

pub use types::{
    AnomalyCrossTab, CategoricalColumn, Column, ColumnExtremum, ColumnStats, FilterCriteria,
    FilterDomain, Flag, InvalidColumnError, MachineAnomalyCount, NumericColumn, Period,
    Selection, SensorRecord, SummaryCounts, TableShape,
};

pub use pipeline::{
    anomaly_failure_cross_tab, column_extremum, column_stats, filter, recompute, summary_counts,
    top_anomalous_machines, value_counts, DataLoadError, Dataset, LoadOptions, ViewCache,
    ViewModel,
};

pub use export::{to_csv_bytes, ColumnSelection, ExportError};
