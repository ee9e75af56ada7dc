//! Common test fixtures for forecast-map tests.
//!
//! Provides a GFS-like quarter-degree dataset over western Java, an
//! in-memory archive publishing it, and basemap GeoJSON files.

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use forecast_archive::{DatasetSnapshot, MemoryArchive};
use forecast_common::{ArchiveField, ForecastCycle, RunHour, TimeAxis};
use serde_json::json;
use tempfile::TempDir;

use crate::generators;

/// Hours between archive time steps.
pub const STEP_HOURS: i64 = 3;

/// Quarter-degree spacing of the synthetic grid.
pub const GRID_STEP: f64 = 0.25;

/// The 2025-01-01 00Z cycle.
pub fn gfs_cycle() -> ForecastCycle {
    ForecastCycle::new(
        chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        RunHour::Z00,
    )
}

/// Latitudes -8.0 to -4.0, ascending.
pub fn java_lats() -> Vec<f64> {
    (0..=16).map(|i| -8.0 + i as f64 * GRID_STEP).collect()
}

/// Longitudes 105.0 to 109.0, ascending.
pub fn java_lons() -> Vec<f64> {
    (0..=16).map(|j| 105.0 + j as f64 * GRID_STEP).collect()
}

/// 3-hourly time axis starting at the cycle's init time.
pub fn time_axis(cycle: &ForecastCycle, steps: usize) -> TimeAxis {
    TimeAxis::hourly(cycle.init_time(), steps, STEP_HOURS)
}

/// Snapshot with all five archive fields from [`generators`].
pub fn gfs_like_snapshot(cycle: &ForecastCycle, steps: usize) -> DatasetSnapshot {
    DatasetSnapshot::new(time_axis(cycle, steps), java_lats(), java_lons())
        .with_field_fn(ArchiveField::PrecipitationRate, generators::precipitation_rate)
        .and_then(|s| s.with_field_fn(ArchiveField::Temperature2m, generators::temperature_k))
        .and_then(|s| s.with_field_fn(ArchiveField::UWind10m, generators::u_wind_ms))
        .and_then(|s| s.with_field_fn(ArchiveField::VWind10m, generators::v_wind_ms))
        .and_then(|s| s.with_field_fn(ArchiveField::MeanSeaLevelPressure, generators::pressure_pa))
        .unwrap()
}

/// Snapshot where every field is constant, for exact derivation checks.
pub fn constant_snapshot(
    cycle: &ForecastCycle,
    steps: usize,
    temperature_k: f32,
    u: f32,
    v: f32,
) -> DatasetSnapshot {
    DatasetSnapshot::new(time_axis(cycle, steps), java_lats(), java_lons())
        .with_field_fn(ArchiveField::PrecipitationRate, generators::constant(0.001))
        .and_then(|s| s.with_field_fn(ArchiveField::Temperature2m, generators::constant(temperature_k)))
        .and_then(|s| s.with_field_fn(ArchiveField::UWind10m, generators::constant(u)))
        .and_then(|s| s.with_field_fn(ArchiveField::VWind10m, generators::constant(v)))
        .and_then(|s| s.with_field_fn(ArchiveField::MeanSeaLevelPressure, generators::constant(101_325.0)))
        .unwrap()
}

/// Memory archive publishing a GFS-like snapshot for `cycle`.
pub fn published_archive(cycle: &ForecastCycle, steps: usize) -> Arc<MemoryArchive> {
    let archive = MemoryArchive::new();
    archive.insert(*cycle, gfs_like_snapshot(cycle, steps));
    Arc::new(archive)
}

/// Valid time offset of a step, for title checks.
pub fn step_offset(index: usize) -> Duration {
    Duration::hours(index as i64 * STEP_HOURS)
}

/// Write `land.geojson`, `coastline.geojson` and `borders.geojson` under `dir`.
pub fn write_basemap(dir: &Path) -> std::io::Result<()> {
    // North coast of Java near Jakarta Bay, simplified
    let coast = vec![
        [105.9, -5.95],
        [106.4, -6.0],
        [106.7, -6.05],
        [106.85, -6.1],
        [107.0, -6.0],
        [107.4, -5.95],
        [107.9, -6.2],
    ];
    let mut land_ring: Vec<[f64; 2]> = coast.clone();
    land_ring.extend([[107.9, -7.3], [105.9, -7.3], [105.9, -5.95]]);

    let land = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "name": "Java" },
            "geometry": { "type": "Polygon", "coordinates": [land_ring] }
        }]
    });
    let coastline = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "LineString", "coordinates": coast }
        }]
    });
    let borders = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "name": "DKI Jakarta / Jawa Barat" },
            "geometry": {
                "type": "MultiLineString",
                "coordinates": [[[106.7, -6.05], [106.7, -6.35], [107.0, -6.35], [107.0, -6.0]]]
            }
        }]
    });

    std::fs::write(dir.join("land.geojson"), land.to_string())?;
    std::fs::write(dir.join("coastline.geojson"), coastline.to_string())?;
    std::fs::write(dir.join("borders.geojson"), borders.to_string())?;
    Ok(())
}

/// Temporary directory holding the basemap fixture files.
pub fn basemap_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path()).unwrap();
    dir
}
