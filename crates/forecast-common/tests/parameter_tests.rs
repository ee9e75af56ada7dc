//! Tests for parameter resolution and derived quantities.

use forecast_common::{
    ArchiveField, BaseFields, ColorScale, ForecastError, ParameterId, ParameterSpec,
    RenderingMode,
};

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ============================================================================
// Resolution tests
// ============================================================================

#[test]
fn test_resolve_all_builtins() {
    for id in ParameterId::ALL {
        let spec = ParameterSpec::resolve(id.as_str()).unwrap();
        assert_eq!(spec.id, id);
        assert!(!spec.label.is_empty());
    }
}

#[test]
fn test_resolve_unknown_field() {
    let err = ParameterSpec::resolve("unknown_field").unwrap_err();
    assert!(matches!(err, ForecastError::UnknownParameter(ref s) if s == "unknown_field"));
    assert_eq!(err.error_code(), "UnknownParameter");
}

#[test]
fn test_resolve_rejects_archive_names() {
    for field in ArchiveField::ALL {
        assert!(ParameterSpec::resolve(field.gfs_variable()).is_err());
    }
    assert!(ParameterSpec::resolve("").is_err());
    assert!(ParameterSpec::resolve(" surface_wind").is_err());
}

#[test]
fn test_precipitation_spec() {
    let spec = ParameterId::PrecipitationRate.spec();
    assert_eq!(
        spec.base_fields,
        BaseFields::Scalar(ArchiveField::PrecipitationRate)
    );
    assert_eq!(spec.rendering_mode, RenderingMode::Raster);
    assert_eq!(spec.color_scale, ColorScale::Precipitation);
    assert_eq!(spec.value_range, Some((0.0, 50.0)));
}

#[test]
fn test_pressure_is_contoured() {
    let spec = ParameterId::MeanSeaLevelPressure.spec();
    assert_eq!(spec.rendering_mode, RenderingMode::Contour);
    assert_eq!(spec.unit_label, "hPa");
}

#[test]
fn test_with_value_range_overrides() {
    let spec = ParameterId::SurfaceTemperature
        .spec()
        .with_value_range(Some((20.0, 35.0)));
    assert_eq!(spec.value_range, Some((20.0, 35.0)));
    assert_eq!(spec.id, ParameterId::SurfaceTemperature);
}

// ============================================================================
// Derived-quantity tests
// ============================================================================

#[test]
fn test_surface_temperature_kelvin_to_celsius() {
    let spec = ParameterSpec::resolve("surface_temperature").unwrap();
    assert_eq!(spec.rendering_mode, RenderingMode::Raster);
    assert_close(spec.derive_value(&[300.15]), 27.0);
}

#[test]
fn test_surface_wind_magnitude_in_knots() {
    let spec = ParameterSpec::resolve("surface_wind").unwrap();
    assert_eq!(spec.rendering_mode, RenderingMode::RasterWithVector);
    assert_close(spec.derive_value(&[3.0, 4.0]), 9.7192);
}

#[test]
fn test_precipitation_rate_per_hour() {
    let spec = ParameterId::PrecipitationRate.spec();
    let raw = [0.0f32, 0.001, 0.005];
    let derived = spec.derive(&[&raw]).unwrap();
    assert_close(derived[0], 0.0);
    assert_close(derived[1], 3.6);
    assert_close(derived[2], 18.0);
}

#[test]
fn test_pressure_pascals_to_hpa() {
    let spec = ParameterId::MeanSeaLevelPressure.spec();
    let raw = [101325.0f32, 100800.0];
    let derived = spec.derive(&[&raw]).unwrap();
    assert_close(derived[0], 1013.25);
    assert_close(derived[1], 1008.0);
}

#[test]
fn test_wind_field_derivation() {
    let spec = ParameterId::SurfaceWind.spec();
    let u = [3.0f32, 0.0, -6.0];
    let v = [4.0f32, -2.0, 8.0];
    let derived = spec.derive(&[&u, &v]).unwrap();
    assert_close(derived[0], 5.0 * 1.94384);
    assert_close(derived[1], 2.0 * 1.94384);
    assert_close(derived[2], 10.0 * 1.94384);
}

#[test]
fn test_derive_rejects_mismatched_components() {
    let spec = ParameterId::SurfaceWind.spec();
    let u = [1.0f32, 2.0];
    let v = [1.0f32];
    assert!(matches!(
        spec.derive(&[&u, &v]),
        Err(ForecastError::InternalError(_))
    ));
}

#[test]
fn test_derive_is_deterministic() {
    let spec = ParameterId::SurfaceWind.spec();
    let u: Vec<f32> = (0..100).map(|i| (i as f32 * 0.37).sin() * 12.0).collect();
    let v: Vec<f32> = (0..100).map(|i| (i as f32 * 0.11).cos() * 9.0).collect();
    let a = spec.derive(&[&u, &v]).unwrap();
    let b = spec.derive(&[&u, &v]).unwrap();
    let bits = |x: &[f32]| x.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
}
