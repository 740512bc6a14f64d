//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, DashboardState};

/// Build the v2 API router.
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/system/health", get(handlers::system_health))
        // Dataset
        .route("/dataset", get(handlers::dataset_info))
        .route("/dataset/reload", post(handlers::reload_dataset))
        .route("/domain", get(handlers::filter_domain))
        // Filtered view
        .route("/view", get(handlers::view))
        .route("/records", get(handlers::records))
        .route("/export.csv", get(handlers::export_csv))
        .route("/summary", get(handlers::summary))
        .route("/anomalies/top", get(handlers::top_anomalies))
        .route("/anomalies/crosstab", get(handlers::anomaly_cross_tab))
        // Per-column
        .route("/columns/:column/extremum", get(handlers::column_extremum))
        .route("/columns/:column/stats", get(handlers::column_stats))
        .route("/columns/:column/counts", get(handlers::column_counts))
        .with_state(state)
}

/// Legacy health endpoint at root level
pub fn legacy_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::legacy_health_check))
        .with_state(state)
}
