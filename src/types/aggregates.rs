//! Derived tables and metrics shown on the dashboard.
//!
//! Every type here has an explicit zero-row form: counts are 0, and values
//! that would need a division by the row count are `None`.

use super::column::NumericColumn;
use super::record::Flag;
use serde::{Deserialize, Serialize};

/// Metric tiles at the top of the overview tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub total_records: usize,
    pub distinct_machines: usize,
    pub failure_records: usize,
}

/// One bar of the "machines with most anomalies" chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineAnomalyCount {
    pub machine: String,
    pub count: usize,
}

/// One slice of a categorical distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub label: String,
    pub count: usize,
}

/// Row-normalised percentages of one anomaly group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossTabPercentages {
    /// Share of the group in failure or needing maintenance.
    pub failure_or_maintenance: f64,
    pub no_failure_or_maintenance: f64,
}

/// One row of the anomaly x failure-or-maintenance cross-tabulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossTabRow {
    pub anomaly_flag: Flag,
    /// Records in this anomaly group.
    pub records: usize,
    pub failure_or_maintenance: usize,
    /// `None` when the group is empty.
    pub percentages: Option<CrossTabPercentages>,
}

/// Cross-tabulation of `anomaly_flag` against `failure_or_maintenance`.
///
/// Always holds one row per flag value, "No" first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCrossTab {
    pub rows: Vec<CrossTabRow>,
}

impl AnomalyCrossTab {
    pub fn row(&self, flag: Flag) -> Option<&CrossTabRow> {
        self.rows.iter().find(|r| r.anomaly_flag == flag)
    }

    pub fn percentages(&self, flag: Flag) -> Option<CrossTabPercentages> {
        self.row(flag).and_then(|r| r.percentages)
    }
}

/// An extreme reading and the machine that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    pub value: f64,
    pub machine: String,
}

/// Minimum and maximum of a measurement column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnExtremum {
    pub column: NumericColumn,
    pub min: Extreme,
    pub max: Extreme,
}

/// Descriptive statistics backing the histogram and box-plot tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: NumericColumn,
    /// Readings present (missing values excluded).
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two readings.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub max: f64,
}

/// "N rows x M columns" caption under the data table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
}

impl std::fmt::Display for TableShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rows x {} columns", self.rows, self.columns)
    }
}
