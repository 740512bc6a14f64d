//! v2 API handlers.
//!
//! All handlers return `Response` via [`ApiResponse::ok`] or
//! [`ApiErrorResponse`]. Each request rebuilds its `FilterCriteria` from the
//! query string and reads the view through the shared cache.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::envelope::{ApiErrorResponse, ApiResponse};
use super::query::{ColumnsQuery, FilterQuery, PageQuery, TopQuery};
use crate::config::{DashboardConfig, ExportConfig, ViewConfig};
use crate::export::{project_json, to_csv_bytes};
use crate::pipeline::{
    recompute, value_counts, CacheStats, Dataset, DatasetSource, LoadOptions, ViewCache, ViewKey,
    ViewMetrics, ViewModel,
};
use crate::types::{CategoricalColumn, Column, FilterCriteria, NumericColumn, TableShape};

// ============================================================================
// Shared state
// ============================================================================

/// State shared by every handler.
#[derive(Clone)]
pub struct DashboardState {
    /// Current dataset; replaced wholesale on reload.
    pub dataset: Arc<ArcSwap<Dataset>>,
    pub cache: Arc<Mutex<ViewCache>>,
    pub load_options: LoadOptions,
    pub view: ViewConfig,
    pub export: ExportConfig,
    pub started_at: Instant,
    /// Serialises reloads so each one starts from the dataset it replaces.
    reload_lock: Arc<tokio::sync::Mutex<()>>,
}

impl DashboardState {
    pub fn new(dataset: Dataset, config: &DashboardConfig) -> Self {
        Self {
            dataset: Arc::new(ArcSwap::from_pointee(dataset)),
            cache: Arc::new(Mutex::new(ViewCache::new(config.view.cache_capacity))),
            load_options: LoadOptions {
                skip_invalid_rows: config.dataset.skip_invalid_rows,
            },
            view: config.view.clone(),
            export: config.export.clone(),
            started_at: Instant::now(),
            reload_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn current_dataset(&self) -> Arc<Dataset> {
        self.dataset.load_full()
    }

    /// Filtered view for `criteria`, served from the cache when possible.
    ///
    /// The cache lock is held only for lookup and insertion; a miss is
    /// computed on the blocking pool.
    pub async fn view(&self, criteria: &FilterCriteria, top_n: usize) -> Result<Arc<ViewModel>, tokio::task::JoinError> {
        let dataset = self.current_dataset();
        let key = ViewKey::new(&dataset, criteria, top_n);
        let cached = self.lock_cache().lookup(&dataset, &key);
        if let Some(view) = cached {
            return Ok(view);
        }

        let compute_key = key.clone();
        let view = tokio::task::spawn_blocking(move || {
            Arc::new(recompute(&dataset, compute_key.criteria(), compute_key.top_n()))
        })
        .await?;
        Ok(self.lock_cache().insert(key, view))
    }

    /// A panic while holding the lock leaves the cache structurally intact.
    fn lock_cache(&self) -> MutexGuard<'_, ViewCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Resolve the filter and build the view, or the error response to send.
async fn filtered_view(state: &DashboardState, filter: &FilterQuery, top_n: usize) -> Result<Arc<ViewModel>, Response> {
    let criteria = filter.criteria().map_err(ApiErrorResponse::bad_request)?;
    state
        .view(&criteria, top_n)
        .await
        .map_err(|e| ApiErrorResponse::internal(format!("View computation failed: {e}")))
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LegacyHealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct SystemHealth {
    pub status: &'static str,
    pub dataset_version: u64,
    pub records: usize,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub source: DatasetSource,
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub shape: TableShape,
    /// "N rows x M columns"
    pub caption: String,
    pub columns: Vec<Column>,
    pub skipped_rows: usize,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse<'a> {
    pub dataset_version: u64,
    pub criteria: &'a FilterCriteria,
    pub shape: TableShape,
    pub caption: String,
    /// No record matched the filter.
    pub is_empty: bool,
    pub metrics: &'a ViewMetrics,
}

#[derive(Debug, Serialize)]
pub struct RecordsPage {
    pub shape: TableShape,
    pub caption: String,
    pub offset: usize,
    pub limit: usize,
    pub columns: Vec<Column>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub version: u64,
    pub records: usize,
    pub skipped_rows: usize,
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn legacy_health_check(State(state): State<DashboardState>) -> Json<LegacyHealthResponse> {
    Json(LegacyHealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
    })
}

/// GET /api/v2/system/health
pub async fn system_health(State(state): State<DashboardState>) -> Response {
    let dataset = state.current_dataset();
    ApiResponse::ok(SystemHealth {
        status: "ok",
        dataset_version: dataset.version(),
        records: dataset.len(),
        uptime_secs: state.uptime_secs(),
        cache: state.cache_stats(),
    })
}

// ============================================================================
// Dataset
// ============================================================================

/// GET /api/v2/dataset
pub async fn dataset_info(State(state): State<DashboardState>) -> Response {
    let dataset = state.current_dataset();
    ApiResponse::ok(DatasetInfo {
        source: dataset.source().clone(),
        version: dataset.version(),
        loaded_at: dataset.loaded_at(),
        shape: dataset.shape(),
        caption: dataset.shape().to_string(),
        columns: dataset.columns().to_vec(),
        skipped_rows: dataset.skipped_rows(),
    })
}

/// GET /api/v2/domain: options for the sidebar widgets.
pub async fn filter_domain(State(state): State<DashboardState>) -> Response {
    ApiResponse::ok(state.current_dataset().domain())
}

/// POST /api/v2/dataset/reload
///
/// The old dataset stays in service if the reload fails. Concurrent reloads
/// run one after another, each bumping the version.
pub async fn reload_dataset(State(state): State<DashboardState>) -> Response {
    let _reloading = state.reload_lock.lock().await;
    let current = state.current_dataset();
    let options = state.load_options;
    let reloaded = tokio::task::spawn_blocking(move || current.reload(options)).await;

    match reloaded {
        Ok(Ok(dataset)) => {
            let body = ReloadResponse {
                version: dataset.version(),
                records: dataset.len(),
                skipped_rows: dataset.skipped_rows(),
            };
            state.dataset.store(Arc::new(dataset));
            state.lock_cache().clear();
            ApiResponse::ok(body)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Dataset reload failed, keeping current dataset");
            ApiErrorResponse::data_load_error(format!("Reload failed: {e}"))
        }
        Err(e) => ApiErrorResponse::internal(format!("Reload task failed: {e}")),
    }
}

// ============================================================================
// View & table
// ============================================================================

/// GET /api/v2/view: every metric of the filtered view, without rows.
pub async fn view(State(state): State<DashboardState>, Query(filter): Query<FilterQuery>) -> Response {
    let view = match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ApiResponse::ok(ViewResponse {
        dataset_version: view.dataset().version(),
        criteria: view.criteria(),
        shape: view.shape(),
        caption: view.shape().to_string(),
        is_empty: view.is_empty(),
        metrics: view.metrics(),
    })
}

/// GET /api/v2/records?columns=&offset=&limit=
pub async fn records(
    State(state): State<DashboardState>,
    Query(filter): Query<FilterQuery>,
    Query(columns): Query<ColumnsQuery>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(page)) = page else {
        return ApiErrorResponse::bad_request("offset and limit must be non-negative integers");
    };
    let view = match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let selection = match columns.selection(view.dataset().columns()) {
        Ok(s) => s,
        Err(e) => return ApiErrorResponse::invalid_column(e.to_string()),
    };

    let (offset, limit) = page.window(state.view.default_page_size, state.view.max_page_size);
    let shape = TableShape {
        rows: view.len(),
        columns: selection.len(),
    };
    ApiResponse::ok(RecordsPage {
        shape,
        caption: shape.to_string(),
        offset,
        limit,
        columns: selection.columns().to_vec(),
        rows: project_json(view.page(offset, limit), &selection),
    })
}

/// GET /api/v2/export.csv?columns=: the filtered, projected table as a download.
pub async fn export_csv(
    State(state): State<DashboardState>,
    Query(filter): Query<FilterQuery>,
    Query(columns): Query<ColumnsQuery>,
) -> Response {
    let view = match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let selection = match columns.selection(view.dataset().columns()) {
        Ok(s) => s,
        Err(e) => return ApiErrorResponse::invalid_column(e.to_string()),
    };

    let bytes = match to_csv_bytes(view.rows(), &selection) {
        Ok(b) => b,
        Err(e) => return ApiErrorResponse::internal(format!("Export failed: {e}")),
    };

    let disposition = format!("attachment; filename=\"{}\"", state.export.file_name);
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    tracing::debug!(rows = view.len(), columns = selection.len(), bytes = bytes.len(), "CSV export");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

// ============================================================================
// Metrics
// ============================================================================

/// GET /api/v2/summary
pub async fn summary(State(state): State<DashboardState>, Query(filter): Query<FilterQuery>) -> Response {
    match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(view) => ApiResponse::ok(view.metrics().summary),
        Err(resp) => resp,
    }
}

/// GET /api/v2/anomalies/top?n=
pub async fn top_anomalies(
    State(state): State<DashboardState>,
    Query(filter): Query<FilterQuery>,
    top: Result<Query<TopQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(top)) = top else {
        return ApiErrorResponse::bad_request("n must be a non-negative integer");
    };
    let n = top.n.unwrap_or(state.view.top_n);
    match filtered_view(&state, &filter, n).await {
        Ok(view) => ApiResponse::ok(&view.metrics().top_anomalous),
        Err(resp) => resp,
    }
}

/// GET /api/v2/anomalies/crosstab
pub async fn anomaly_cross_tab(State(state): State<DashboardState>, Query(filter): Query<FilterQuery>) -> Response {
    match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(view) => ApiResponse::ok(&view.metrics().anomaly_cross_tab),
        Err(resp) => resp,
    }
}

/// GET /api/v2/columns/:column/extremum. `data` is null when no row has a
/// reading.
pub async fn column_extremum(
    State(state): State<DashboardState>,
    Path(column): Path<String>,
    Query(filter): Query<FilterQuery>,
) -> Response {
    let column = match column.parse::<NumericColumn>() {
        Ok(c) => c,
        Err(e) => return ApiErrorResponse::invalid_column(e.to_string()),
    };
    match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(view) => ApiResponse::ok(view.metrics().extremum(column)),
        Err(resp) => resp,
    }
}

/// GET /api/v2/columns/:column/stats
pub async fn column_stats(
    State(state): State<DashboardState>,
    Path(column): Path<String>,
    Query(filter): Query<FilterQuery>,
) -> Response {
    let column = match column.parse::<NumericColumn>() {
        Ok(c) => c,
        Err(e) => return ApiErrorResponse::invalid_column(e.to_string()),
    };
    match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(view) => ApiResponse::ok(view.metrics().stats(column)),
        Err(resp) => resp,
    }
}

/// GET /api/v2/columns/:column/counts: label frequencies of a categorical
/// column.
pub async fn column_counts(
    State(state): State<DashboardState>,
    Path(column): Path<String>,
    Query(filter): Query<FilterQuery>,
) -> Response {
    let column = match column.parse::<CategoricalColumn>() {
        Ok(c) => c,
        Err(e) => return ApiErrorResponse::invalid_column(e.to_string()),
    };
    match filtered_view(&state, &filter, state.view.top_n).await {
        Ok(view) => {
            let rows: Vec<_> = view.rows().collect();
            ApiResponse::ok(value_counts(&rows, column))
        }
        Err(resp) => resp,
    }
}
