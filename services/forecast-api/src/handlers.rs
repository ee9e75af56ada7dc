//! HTTP handlers.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use forecast_archive::SelectorStats;
use forecast_common::{
    ArchiveField, ForecastCycle, ForecastError, ForecastResult, ForecastSelection, ParameterId,
    RegionPreset, RenderingMode, Severity,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

use crate::metrics::{MetricsSnapshot, OUTCOME_OK};
use crate::pipeline::{ForecastMap, RenderRequest};
use crate::state::AppState;

pub const X_MAP_TITLE: &str = "x-map-title";
pub const X_PARAMETER: &str = "x-parameter";
pub const X_FORECAST_HOUR: &str = "x-forecast-hour";

// ============================================================================
// Errors
// ============================================================================

/// JSON body of every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

pub fn error_response(err: &ForecastError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse {
        code: err.error_code().to_string(),
        message: err.to_string(),
        severity: err.severity(),
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// Render
// ============================================================================

/// Query string of `/render`. Fields are kept as text so bad values get
/// the service's own error body.
#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    pub run_date: Option<String>,
    pub run_hour: Option<String>,
    pub forecast_hour: Option<String>,
    pub parameter: Option<String>,
    pub contours: Option<String>,
}

impl RenderQuery {
    pub fn into_request(self) -> ForecastResult<RenderRequest> {
        let run_date = required(self.run_date, "run_date")?;
        let run_hour = required(self.run_hour, "run_hour")?;
        let forecast_hour = required(self.forecast_hour, "forecast_hour")?;
        let parameter = required(self.parameter, "parameter")?;

        let cycle = ForecastCycle::parse(run_date.trim(), run_hour.trim())?;
        let index: usize = forecast_hour.trim().parse().map_err(|_| {
            ForecastError::invalid_parameter(
                "forecast_hour",
                format!("'{}' is not a non-negative integer", forecast_hour),
            )
        })?;
        let selection = ForecastSelection::new(cycle, index)?;

        let contours = match self.contours.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => {
                return Err(ForecastError::invalid_parameter(
                    "contours",
                    format!("'{}' is not a boolean", v),
                ))
            }
        };

        Ok(RenderRequest {
            selection,
            parameter: parameter.trim().to_string(),
            contours,
        })
    }
}

fn required(value: Option<String>, name: &str) -> ForecastResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ForecastError::MissingParameter(name.to_string()))
}

/// GET /render - Render one forecast map as PNG
#[instrument(skip(state))]
pub async fn render_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<RenderQuery>,
) -> Response {
    let start = Instant::now();

    let request = match query.into_request() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected render request");
            state.metrics.record_render("unknown", e.error_code(), start.elapsed());
            return error_response(&e);
        }
    };

    let result = state.service.render(&request).await;
    state
        .metrics
        .record_selector_stats(&state.service.selector().stats().await);

    match result {
        Ok(map) => {
            state
                .metrics
                .record_render(map.spec.id.as_str(), OUTCOME_OK, start.elapsed());
            png_response(map)
        }
        Err(e) => {
            let parameter = ParameterId::from_str(&request.parameter)
                .map(|id| id.as_str())
                .unwrap_or("unknown");
            match e.severity() {
                Severity::Warning => warn!(error = %e, "Render request failed"),
                Severity::Error => error!(error = %e, "Render request failed"),
            }
            state
                .metrics
                .record_render(parameter, e.error_code(), start.elapsed());
            error_response(&e)
        }
    }
}

fn png_response(map: ForecastMap) -> Response {
    let title = HeaderValue::from_bytes(map.artifact.title.as_bytes()).ok();
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        Bytes::from(map.artifact.png),
    )
        .into_response();

    let headers = response.headers_mut();
    if let Some(title) = title {
        headers.insert(X_MAP_TITLE, title);
    }
    headers.insert(X_PARAMETER, HeaderValue::from_static(map.spec.id.as_str()));
    headers.insert(
        X_FORECAST_HOUR,
        HeaderValue::from(map.selection.forecast_hour_index),
    );
    response
}

// ============================================================================
// Catalog
// ============================================================================

/// One built-in parameter as listed by `/api/parameters`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub id: ParameterId,
    pub label: String,
    pub unit: String,
    pub rendering_mode: RenderingMode,
    pub fields: Vec<ArchiveField>,
    pub value_range: Option<(f32, f32)>,
}

/// GET /api/parameters - The four built-in parameters
pub async fn parameters_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<ParameterInfo>> {
    let parameters = state
        .service
        .parameters()
        .into_iter()
        .map(|spec| ParameterInfo {
            id: spec.id,
            label: spec.label.to_string(),
            unit: spec.unit_label.to_string(),
            rendering_mode: spec.rendering_mode,
            fields: spec.base_fields.fields(),
            value_range: spec.value_range,
        })
        .collect();
    Json(parameters)
}

/// GET /api/region - The active region preset
pub async fn region_handler(Extension(state): Extension<Arc<AppState>>) -> Json<RegionPreset> {
    Json(state.service.region().clone())
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: SelectorStats,
    pub hit_rate_percent: f64,
}

/// GET /api/cache/stats - Dataset cache statistics
pub async fn cache_stats_handler(Extension(state): Extension<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let stats = state.service.selector().stats().await;
    Json(CacheStatsResponse {
        hit_rate_percent: stats.hit_rate(),
        stats,
    })
}

// ============================================================================
// Health and metrics
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}

/// GET /api/metrics - Request counters as JSON
pub async fn api_metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
