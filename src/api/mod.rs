//! REST API module using Axum
//!
//! Serves the filtered dashboard view over HTTP:
//! - v2 API under `/api/v2` with the `{data, meta}` envelope
//! - legacy liveness probe at `/health`

pub mod envelope;
pub mod handlers;
pub mod query;
mod routes;

pub use handlers::DashboardState;

use axum::http::{header, Method};
use axum::Router;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Environment variable listing allowed cross-origin callers.
pub const CORS_ORIGINS_ENV_VAR: &str = "SENSOR_EXPLORER_CORS_ORIGINS";

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `SENSOR_EXPLORER_CORS_ORIGINS` to a comma-separated list of allowed
/// origins when the presentation layer is served from elsewhere.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    match std::env::var(CORS_ORIGINS_ENV_VAR) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: DashboardState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v2", routes::api_routes(state.clone()))
        .merge(routes::legacy_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(build_cors_layer())
}
