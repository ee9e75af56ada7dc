//! HTTP tests for the forecast API router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use forecast_api::build_router;
use forecast_api::config::ServiceConfig;
use forecast_api::handlers::{ErrorResponse, ParameterInfo, X_FORECAST_HOUR, X_MAP_TITLE, X_PARAMETER};
use forecast_api::state::AppState;
use forecast_archive::{ForecastArchive, MemoryArchive};
use forecast_common::{ArchiveField, ParameterId, RenderingMode, Severity};
use map_renderer::png::PNG_SIGNATURE;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use tempfile::TempDir;
use test_utils::{basemap_dir, gfs_cycle, published_archive};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    archive: Arc<MemoryArchive>,
    _basemap: TempDir,
}

fn app() -> TestApp {
    let archive = published_archive(&gfs_cycle(), 8);
    let basemap = basemap_dir();
    let config = ServiceConfig {
        basemap_dir: Some(basemap.path().to_path_buf()),
        ..ServiceConfig::default()
    };
    let state = AppState::with_archive(config, archive.clone() as Arc<dyn ForecastArchive>).unwrap();
    let handle = PrometheusBuilder::new().build_recorder().handle();

    TestApp {
        router: build_router(Arc::new(state), handle),
        archive,
        _basemap: basemap,
    }
}

async fn get(router: &Router, uri: &str) -> Response {
    router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn error(response: Response) -> ErrorResponse {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ============================================================================
// Render
// ============================================================================

#[tokio::test]
async fn test_render_returns_png_with_title_headers() {
    let app = app();
    let response = get(
        &app.router,
        "/render?run_date=20250101&run_hour=00&forecast_hour=2&parameter=mean_sea_level_pressure",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[X_PARAMETER], "mean_sea_level_pressure");
    assert_eq!(headers[X_FORECAST_HOUR], "2");
    let title = String::from_utf8(headers[X_MAP_TITLE].as_bytes().to_vec()).unwrap();
    assert_eq!(
        title,
        "Mean Sea Level Pressure (hPa) • Valid: 06UTC Wed, 01 Jan 2025 • GFS t+002"
    );

    let png = body_bytes(response).await;
    assert_eq!(&png[..8], &PNG_SIGNATURE);
}

#[tokio::test]
async fn test_render_with_contour_toggle() {
    let app = app();
    let response = get(
        &app.router,
        "/render?run_date=20250101&run_hour=00&forecast_hour=0&parameter=surface_temperature&contours=true",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_parameter_is_warning_without_fetch() {
    let app = app();
    let response = get(
        &app.router,
        "/render?run_date=20250101&run_hour=00&forecast_hour=0&parameter=unknown_field",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error(response).await;
    assert_eq!(body.code, "UnknownParameter");
    assert_eq!(body.severity, Severity::Warning);
    assert!(body.message.contains("unknown_field"));
    assert_eq!(app.archive.open_count(), 0);
}

#[tokio::test]
async fn test_forecast_hour_beyond_axis() {
    let app = app();
    let response = get(
        &app.router,
        "/render?run_date=20250101&run_hour=00&forecast_hour=8&parameter=surface_wind",
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = error(response).await;
    assert_eq!(body.code, "ForecastHourOutOfRange");
    assert_eq!(body.severity, Severity::Error);
}

#[tokio::test]
async fn test_unpublished_cycle_is_data_unavailable() {
    let app = app();
    let response = get(
        &app.router,
        "/render?run_date=20250102&run_hour=12&forecast_hour=0&parameter=surface_wind",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(error(response).await.code, "DataUnavailable");
}

#[tokio::test]
async fn test_invalid_query_values() {
    let app = app();
    for uri in [
        "/render?run_date=2025-01-01&run_hour=00&forecast_hour=0&parameter=surface_wind",
        "/render?run_date=20250101&run_hour=03&forecast_hour=0&parameter=surface_wind",
        "/render?run_date=20250101&run_hour=00&forecast_hour=241&parameter=surface_wind",
        "/render?run_date=20250101&run_hour=00&forecast_hour=abc&parameter=surface_wind",
        "/render?run_date=20250101&run_hour=00&forecast_hour=0&parameter=surface_wind&contours=yes",
    ] {
        let response = get(&app.router, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(error(response).await.code, "InvalidParameter", "{}", uri);
    }
    assert_eq!(app.archive.open_count(), 0);
}

#[tokio::test]
async fn test_missing_query_values() {
    let app = app();
    let response = get(&app.router, "/render?run_date=20250101&run_hour=00&parameter=surface_wind").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error(response).await;
    assert_eq!(body.code, "MissingParameter");
    assert!(body.message.contains("forecast_hour"));
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_parameters_listing() {
    let app = app();
    let response = get(&app.router, "/api/parameters").await;
    assert_eq!(response.status(), StatusCode::OK);

    let parameters: Vec<ParameterInfo> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let ids: Vec<ParameterId> = parameters.iter().map(|p| p.id).collect();
    assert_eq!(ids, ParameterId::ALL.to_vec());

    let wind = &parameters[2];
    assert_eq!(wind.unit, "knots");
    assert_eq!(wind.rendering_mode, RenderingMode::RasterWithVector);
    assert_eq!(wind.fields, vec![ArchiveField::UWind10m, ArchiveField::VWind10m]);
    assert_eq!(wind.value_range, Some((0.0, 50.0)));

    let pressure = &parameters[3];
    assert_eq!(pressure.rendering_mode, RenderingMode::Contour);
    assert_eq!(pressure.value_range, None);
}

#[tokio::test]
async fn test_active_region() {
    let app = app();
    let body = json(get(&app.router, "/api/region").await).await;

    assert_eq!(body["name"], "jakarta");
    assert_eq!(body["box"]["lat_min"], -6.4);
    assert_eq!(body["box"]["lon_max"], 107.05);
    assert_eq!(body["marker"]["name"], "Kemayoran");
}

#[tokio::test]
async fn test_cache_stats_after_renders() {
    let app = app();
    for parameter in ["surface_wind", "precipitation_rate"] {
        let uri = format!(
            "/render?run_date=20250101&run_hour=00&forecast_hour=1&parameter={}",
            parameter
        );
        assert_eq!(get(&app.router, &uri).await.status(), StatusCode::OK);
    }

    let body = json(get(&app.router, "/api/cache/stats").await).await;
    assert_eq!(body["selections"], 2);
    assert_eq!(body["hits"], 1);
    assert_eq!(body["fetches"], 1);
    assert_eq!(body["cached"], 1);
    assert_eq!(body["capacity"], 16);
    assert_eq!(body["hit_rate_percent"], 50.0);
    assert_eq!(app.archive.open_count(), 1);
}

// ============================================================================
// Health and metrics
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = get(&app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_prometheus_endpoint() {
    let app = app();
    let response = get(&app.router, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_request_counters() {
    let app = app();
    get(
        &app.router,
        "/render?run_date=20250101&run_hour=00&forecast_hour=0&parameter=surface_temperature",
    )
    .await;
    get(
        &app.router,
        "/render?run_date=20250101&run_hour=00&forecast_hour=0&parameter=unknown_field",
    )
    .await;

    let body = json(get(&app.router, "/api/metrics").await).await;
    assert_eq!(body["renders_total"], 2);
    assert_eq!(body["render_errors"], 1);
}
