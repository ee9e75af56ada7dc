//! Forecast map service.
//!
//! HTTP trigger interface over the forecast map pipeline: a caller picks a
//! forecast cycle, a lead-time index and one of the built-in parameters and
//! receives a PNG map of the configured region.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod pipeline;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router.
pub fn build_router(state: Arc<AppState>, prometheus_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/render", get(handlers::render_handler))
        // Catalog
        .route("/api/parameters", get(handlers::parameters_handler))
        .route("/api/region", get(handlers::region_handler))
        .route("/api/cache/stats", get(handlers::cache_stats_handler))
        .route("/api/metrics", get(handlers::api_metrics_handler))
        // Health and metrics
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
