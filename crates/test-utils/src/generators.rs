//! Synthetic weather-like fields in archive units.
//!
//! Each generator is a pure function of `(time_index, lat, lon)`, so a
//! dataset built from them is reproducible and easy to verify.

use std::f64::consts::PI;

/// Surface temperature in kelvin.
///
/// Warmer over the western part of the box, with a diurnal swing of ±3 K
/// on a 3-hourly time axis.
pub fn temperature_k(t: usize, lat: f64, lon: f64) -> f32 {
    let diurnal = (t as f64 * 3.0 / 24.0 * 2.0 * PI).sin() * 3.0;
    (300.15 + (lat + 6.0) * 0.8 - (lon - 106.8) * 1.5 + diurnal) as f32
}

/// Eastward 10 m wind in m/s.
pub fn u_wind_ms(t: usize, lat: f64, _lon: f64) -> f32 {
    (3.0 + (lat + 6.2) * 2.0 + t as f64 * 0.1) as f32
}

/// Northward 10 m wind in m/s.
pub fn v_wind_ms(_t: usize, _lat: f64, lon: f64) -> f32 {
    (4.0 - (lon - 106.8) * 2.0) as f32
}

/// Precipitation rate in kg m-2 s-1, one rain cell over the city.
pub fn precipitation_rate(t: usize, lat: f64, lon: f64) -> f32 {
    let d2 = (lat + 6.17).powi(2) + (lon - 106.86).powi(2);
    let peak = 0.004 * (1.0 + (t % 4) as f64 * 0.25);
    let rate = peak * (-d2 / 0.02).exp();
    if rate < 1e-6 {
        0.0
    } else {
        rate as f32
    }
}

/// Mean sea level pressure in pascals, a shallow low south-west of the city.
pub fn pressure_pa(t: usize, lat: f64, lon: f64) -> f32 {
    let d2 = (lat + 6.6).powi(2) + (lon - 106.3).powi(2);
    (101_000.0 - 400.0 * (-d2 / 0.5).exp() + t as f64 * 5.0) as f32
}

/// Constant field, handy for exact-value checks.
pub fn constant(value: f32) -> impl Fn(usize, f64, f64) -> f32 {
    move |_, _, _| value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_are_deterministic() {
        assert_eq!(temperature_k(3, -6.2, 106.8), temperature_k(3, -6.2, 106.8));
        assert_eq!(pressure_pa(1, -6.0, 107.0), pressure_pa(1, -6.0, 107.0));
    }

    #[test]
    fn test_generators_stay_physical() {
        for t in 0..8 {
            for lat in [-6.4, -6.2, -6.0] {
                for lon in [106.6, 106.8, 107.0] {
                    let temp = temperature_k(t, lat, lon);
                    assert!(temp > 280.0 && temp < 320.0);
                    assert!(precipitation_rate(t, lat, lon) >= 0.0);
                    let p = pressure_pa(t, lat, lon);
                    assert!(p > 99_000.0 && p < 103_000.0);
                }
            }
        }
    }
}
