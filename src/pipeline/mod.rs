//! Data pipeline
//!
//! ```text
//! CSV file / synthetic generator
//!        │ loader
//!        ▼
//!    Dataset (versioned, shared via Arc)
//!        │ filter(FilterCriteria)
//!        ▼
//!    filtered rows ──aggregate──▶ ViewModel ──▶ ViewCache
//! ```
//!
//! Every stage is a pure function of (records, criteria); re-running it on
//! each widget change is the whole update model.

mod aggregate;
mod cache;
mod dataset;
mod filter;
mod loader;
mod view;

pub use aggregate::{
    anomaly_failure_cross_tab, column_extremum, column_stats, summary_counts,
    top_anomalous_machines, value_counts,
};
pub use cache::{CacheStats, ViewCache, ViewKey};
pub use dataset::{Dataset, DatasetSource};
pub use filter::{filter, filter_indices};
pub use loader::{load_csv, read_csv, DataLoadError, LoadOptions, LoadedTable};
pub use view::{recompute, ViewMetrics, ViewModel};
