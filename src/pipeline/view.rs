//! One dashboard render: the filtered rows plus every derived metric.

use super::aggregate::{
    anomaly_failure_cross_tab, column_extremum, column_stats, summary_counts,
    top_anomalous_machines, value_counts,
};
use super::dataset::Dataset;
use super::filter::filter_indices;
use crate::types::{
    AnomalyCrossTab, CategoricalColumn, ColumnExtremum, ColumnStats, FilterCriteria,
    MachineAnomalyCount, NumericColumn, SensorRecord, SummaryCounts, TableShape, ValueCount,
};
use serde::Serialize;
use std::sync::Arc;

/// Everything derived from the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewMetrics {
    pub summary: SummaryCounts,
    pub top_anomalous: Vec<MachineAnomalyCount>,
    pub anomaly_cross_tab: AnomalyCrossTab,
    /// One entry per measurement column that has at least one reading.
    pub extrema: Vec<ColumnExtremum>,
    pub stats: Vec<ColumnStats>,
    pub status_distribution: Vec<ValueCount>,
    pub failure_type_distribution: Vec<ValueCount>,
}

impl ViewMetrics {
    pub fn extremum(&self, column: NumericColumn) -> Option<&ColumnExtremum> {
        self.extrema.iter().find(|e| e.column == column)
    }

    pub fn stats(&self, column: NumericColumn) -> Option<&ColumnStats> {
        self.stats.iter().find(|s| s.column == column)
    }
}

/// Filtered view of a dataset. Rows are kept as indices into the shared
/// dataset, in source order.
#[derive(Debug, Clone)]
pub struct ViewModel {
    dataset: Arc<Dataset>,
    criteria: FilterCriteria,
    top_n: usize,
    row_indices: Vec<usize>,
    metrics: ViewMetrics,
}

/// Filter `dataset` with `criteria` and compute every metric.
pub fn recompute(dataset: &Arc<Dataset>, criteria: &FilterCriteria, top_n: usize) -> ViewModel {
    let started = std::time::Instant::now();
    let records = dataset.records();
    let row_indices = filter_indices(records, criteria);
    let rows: Vec<&SensorRecord> = row_indices.iter().map(|&i| &records[i]).collect();

    let metrics = ViewMetrics {
        summary: summary_counts(&rows),
        top_anomalous: top_anomalous_machines(&rows, top_n),
        anomaly_cross_tab: anomaly_failure_cross_tab(&rows),
        extrema: NumericColumn::ALL
            .into_iter()
            .filter_map(|c| column_extremum(&rows, c))
            .collect(),
        stats: NumericColumn::ALL
            .into_iter()
            .filter_map(|c| column_stats(&rows, c))
            .collect(),
        status_distribution: value_counts(&rows, CategoricalColumn::MachineStatus),
        failure_type_distribution: value_counts(&rows, CategoricalColumn::FailureType),
    };

    tracing::debug!(
        version = dataset.version(),
        rows = row_indices.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "View recomputed"
    );

    ViewModel {
        dataset: Arc::clone(dataset),
        criteria: criteria.clone(),
        top_n,
        row_indices,
        metrics,
    }
}

impl ViewModel {
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub const fn top_n(&self) -> usize {
        self.top_n
    }

    pub const fn metrics(&self) -> &ViewMetrics {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.row_indices.len()
    }

    /// No row matched: every metric holds its zero-row value.
    pub fn is_empty(&self) -> bool {
        self.row_indices.is_empty()
    }

    /// Filtered rows in source order.
    pub fn rows(&self) -> impl Iterator<Item = &SensorRecord> + '_ {
        let records = self.dataset.records();
        self.row_indices.iter().map(move |&i| &records[i])
    }

    /// A window of the filtered rows.
    pub fn page(&self, offset: usize, limit: usize) -> Vec<&SensorRecord> {
        self.rows().skip(offset).take(limit).collect()
    }

    pub fn shape(&self) -> TableShape {
        TableShape {
            rows: self.row_indices.len(),
            columns: self.dataset.columns().len(),
        }
    }
}
