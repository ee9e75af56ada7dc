//! Region boxes and the deployment presets built on them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ForecastError, ForecastResult};

/// A geographic latitude/longitude rectangle in degrees.
///
/// Bounds are inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl RegionBox {
    /// Create a region box, rejecting inverted or empty ranges.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> ForecastResult<Self> {
        let region = Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        };
        region.validate()?;
        Ok(region)
    }

    /// Check `lat_min < lat_max` and `lon_min < lon_max`.
    pub fn validate(&self) -> ForecastResult<()> {
        let finite = [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ForecastError::Configuration(format!(
                "region bounds must be finite: {:?}",
                self
            )));
        }
        if self.lat_min >= self.lat_max {
            return Err(ForecastError::Configuration(format!(
                "lat_min {} must be below lat_max {}",
                self.lat_min, self.lat_max
            )));
        }
        if self.lon_min >= self.lon_max {
            return Err(ForecastError::Configuration(format!(
                "lon_min {} must be below lon_max {}",
                self.lon_min, self.lon_max
            )));
        }
        Ok(())
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Longitude span in degrees.
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max
    }

    pub fn contains_lon(&self, lon: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max
    }

    /// Check if a point is contained within this box.
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        self.contains_lat(lat) && self.contains_lon(lon)
    }
}

impl fmt::Display for RegionBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat [{}, {}], lon [{}, {}]",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

/// A labeled point of interest drawn on every map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Label offset from the marker, in degrees (applied to both axes)
    #[serde(default = "default_label_offset")]
    pub label_offset: f64,
}

fn default_label_offset() -> f64 {
    0.015
}

impl Marker {
    /// The Kemayoran observation site in central Jakarta.
    pub fn kemayoran() -> Self {
        Self {
            name: "Kemayoran".to_string(),
            lat: -6.1744,
            lon: 106.8650,
            label_offset: default_label_offset(),
        }
    }
}

/// A named region box with its point-of-interest marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPreset {
    pub name: String,
    pub description: String,
    #[serde(rename = "box")]
    pub bbox: RegionBox,
    pub marker: Marker,
}

impl RegionPreset {
    /// Wide city view of Jakarta.
    pub fn jakarta() -> Self {
        Self {
            name: "jakarta".to_string(),
            description: "Wide city view".to_string(),
            bbox: RegionBox {
                lat_min: -6.4,
                lat_max: -5.9,
                lon_min: 106.6,
                lon_max: 107.05,
            },
            marker: Marker::kemayoran(),
        }
    }

    /// Tight view around the Kemayoran site.
    pub fn kemayoran() -> Self {
        Self {
            name: "kemayoran".to_string(),
            description: "Tight point-of-interest view".to_string(),
            bbox: RegionBox {
                lat_min: -6.3,
                lat_max: -6.05,
                lon_min: 106.74,
                lon_max: 106.99,
            },
            marker: Marker::kemayoran(),
        }
    }

    /// Greater Jakarta metropolitan view.
    pub fn jabodetabek() -> Self {
        Self {
            name: "jabodetabek".to_string(),
            description: "Metropolitan area view".to_string(),
            bbox: RegionBox {
                lat_min: -7.2,
                lat_max: -5.2,
                lon_min: 105.9,
                lon_max: 107.9,
            },
            marker: Marker::kemayoran(),
        }
    }

    /// All built-in presets.
    pub fn builtin() -> Vec<RegionPreset> {
        vec![Self::jakarta(), Self::kemayoran(), Self::jabodetabek()]
    }

    /// Look up a preset by name among `presets`.
    pub fn find<'a>(presets: &'a [RegionPreset], name: &str) -> ForecastResult<&'a RegionPreset> {
        presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ForecastError::UnknownRegion(name.to_string()))
    }
}
