//! The closed set of renderable parameters and their resolution.
//!
//! Each [`ParameterId`] maps to exactly one static [`ParameterSpec`] naming
//! the archive field(s) it reads, how raw values become the displayed
//! physical quantity, and how the result is drawn. Identifiers are matched
//! exactly; anything else is an [`ForecastError::UnknownParameter`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ForecastError, ForecastResult};
use crate::style::ColorScale;

/// Meters per second to knots.
pub const MS_TO_KNOTS: f32 = 1.94384;

/// Seconds per hour, for kg m-2 s-1 (mm/s) to mm/hour.
pub const SECONDS_PER_HOUR: f32 = 3600.0;

/// 0 °C in kelvin.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Pascals per hectopascal.
pub const PA_PER_HPA: f32 = 100.0;

/// Logical names of the fields the archive exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveField {
    PrecipitationRate,
    #[serde(rename = "temperature_2m")]
    Temperature2m,
    #[serde(rename = "u_wind_10m")]
    UWind10m,
    #[serde(rename = "v_wind_10m")]
    VWind10m,
    MeanSeaLevelPressure,
}

impl ArchiveField {
    pub const ALL: [ArchiveField; 5] = [
        ArchiveField::PrecipitationRate,
        ArchiveField::Temperature2m,
        ArchiveField::UWind10m,
        ArchiveField::VWind10m,
        ArchiveField::MeanSeaLevelPressure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveField::PrecipitationRate => "precipitation_rate",
            ArchiveField::Temperature2m => "temperature_2m",
            ArchiveField::UWind10m => "u_wind_10m",
            ArchiveField::VWind10m => "v_wind_10m",
            ArchiveField::MeanSeaLevelPressure => "mean_sea_level_pressure",
        }
    }

    /// Variable name in the GFS 0.25° OPeNDAP archive.
    pub fn gfs_variable(&self) -> &'static str {
        match self {
            ArchiveField::PrecipitationRate => "pratesfc",
            ArchiveField::Temperature2m => "tmp2m",
            ArchiveField::UWind10m => "ugrd10m",
            ArchiveField::VWind10m => "vgrd10m",
            ArchiveField::MeanSeaLevelPressure => "prmslmsl",
        }
    }
}

impl fmt::Display for ArchiveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveField {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArchiveField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ForecastError::Configuration(format!("unknown archive field '{}'", s)))
    }
}

/// The field(s) a parameter reads from the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseFields {
    Scalar(ArchiveField),
    /// Two orthogonal components, eastward (u) and northward (v)
    Vector { u: ArchiveField, v: ArchiveField },
}

impl BaseFields {
    /// Fields in read order (u before v).
    pub fn fields(&self) -> Vec<ArchiveField> {
        match *self {
            BaseFields::Scalar(f) => vec![f],
            BaseFields::Vector { u, v } => vec![u, v],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BaseFields::Scalar(_) => 1,
            BaseFields::Vector { .. } => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Unit transformation from raw archive values to display values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", content = "by", rename_all = "snake_case")]
pub enum UnitTransform {
    /// No transformation
    None,
    /// Multiply by a factor (e.g., m/s to knots)
    Multiply(f32),
    /// Subtract a value (e.g., K to °C)
    Subtract(f32),
    /// Divide by a value (e.g., Pa to hPa)
    Divide(f32),
}

impl UnitTransform {
    /// Apply the transformation to a value (computed in f64).
    pub fn apply(&self, value: f32) -> f32 {
        let v = value as f64;
        let out = match *self {
            UnitTransform::None => v,
            UnitTransform::Multiply(k) => v * k as f64,
            UnitTransform::Subtract(k) => v - k as f64,
            UnitTransform::Divide(k) => v / k as f64,
        };
        out as f32
    }
}

/// How a parameter is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderingMode {
    /// Shaded surface with a color legend
    Raster,
    /// Iso-value lines with inline labels
    Contour,
    /// Shaded magnitude with direction arrows from the raw components
    RasterWithVector,
}

/// The four built-in parameter identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterId {
    PrecipitationRate,
    SurfaceTemperature,
    SurfaceWind,
    MeanSeaLevelPressure,
}

impl ParameterId {
    pub const ALL: [ParameterId; 4] = [
        ParameterId::PrecipitationRate,
        ParameterId::SurfaceTemperature,
        ParameterId::SurfaceWind,
        ParameterId::MeanSeaLevelPressure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterId::PrecipitationRate => "precipitation_rate",
            ParameterId::SurfaceTemperature => "surface_temperature",
            ParameterId::SurfaceWind => "surface_wind",
            ParameterId::MeanSeaLevelPressure => "mean_sea_level_pressure",
        }
    }

    /// The static spec for this identifier.
    pub fn spec(&self) -> ParameterSpec {
        match self {
            ParameterId::PrecipitationRate => ParameterSpec {
                id: *self,
                label: "Precipitation Rate (mm/hour)",
                base_fields: BaseFields::Scalar(ArchiveField::PrecipitationRate),
                transform: UnitTransform::Multiply(SECONDS_PER_HOUR),
                unit_label: "mm/hour",
                color_scale: ColorScale::Precipitation,
                value_range: Some((0.0, 50.0)),
                rendering_mode: RenderingMode::Raster,
            },
            ParameterId::SurfaceTemperature => ParameterSpec {
                id: *self,
                label: "Surface Temperature (°C)",
                base_fields: BaseFields::Scalar(ArchiveField::Temperature2m),
                transform: UnitTransform::Subtract(KELVIN_OFFSET),
                unit_label: "°C",
                color_scale: ColorScale::Temperature,
                value_range: None,
                rendering_mode: RenderingMode::Raster,
            },
            ParameterId::SurfaceWind => ParameterSpec {
                id: *self,
                label: "10 m Wind Speed (knots)",
                base_fields: BaseFields::Vector {
                    u: ArchiveField::UWind10m,
                    v: ArchiveField::VWind10m,
                },
                transform: UnitTransform::Multiply(MS_TO_KNOTS),
                unit_label: "knots",
                color_scale: ColorScale::WindSpeed,
                value_range: Some((0.0, 50.0)),
                rendering_mode: RenderingMode::RasterWithVector,
            },
            ParameterId::MeanSeaLevelPressure => ParameterSpec {
                id: *self,
                label: "Mean Sea Level Pressure (hPa)",
                base_fields: BaseFields::Scalar(ArchiveField::MeanSeaLevelPressure),
                transform: UnitTransform::Divide(PA_PER_HPA),
                unit_label: "hPa",
                color_scale: ColorScale::Pressure,
                value_range: None,
                rendering_mode: RenderingMode::Contour,
            },
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterId {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ForecastError::UnknownParameter(s.to_string()))
    }
}

/// Everything needed to read, derive and draw one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub id: ParameterId,
    /// Human-readable label, used in the map title
    pub label: &'static str,
    pub base_fields: BaseFields,
    pub transform: UnitTransform,
    pub unit_label: &'static str,
    pub color_scale: ColorScale,
    /// Fixed color range; `None` scales to the data
    pub value_range: Option<(f32, f32)>,
    pub rendering_mode: RenderingMode,
}

impl ParameterSpec {
    /// Resolve an identifier to its spec.
    pub fn resolve(parameter_id: &str) -> ForecastResult<ParameterSpec> {
        Ok(parameter_id.parse::<ParameterId>()?.spec())
    }

    /// Same spec with a different color range.
    pub fn with_value_range(mut self, value_range: Option<(f32, f32)>) -> Self {
        self.value_range = value_range;
        self
    }

    /// Derive one display value from the raw component values at a point.
    ///
    /// Scalar specs take one component, vector specs take (u, v) and
    /// transform their magnitude.
    pub fn derive_value(&self, components: &[f32]) -> f32 {
        let raw = match (self.base_fields, components) {
            (BaseFields::Vector { .. }, [u, v]) => {
                ((*u as f64).powi(2) + (*v as f64).powi(2)).sqrt() as f32
            }
            (_, [value, ..]) => *value,
            (_, []) => f32::NAN,
        };
        self.transform.apply(raw)
    }

    /// Derive the display field from co-indexed raw component fields.
    pub fn derive(&self, components: &[&[f32]]) -> ForecastResult<Vec<f32>> {
        if components.len() != self.base_fields.len() {
            return Err(ForecastError::InternalError(format!(
                "{} expects {} component field(s), got {}",
                self.id,
                self.base_fields.len(),
                components.len()
            )));
        }
        let n = components[0].len();
        if components.iter().any(|c| c.len() != n) {
            return Err(ForecastError::InternalError(format!(
                "{} component fields differ in length",
                self.id
            )));
        }

        let derived = match self.base_fields {
            BaseFields::Scalar(_) => components[0]
                .iter()
                .map(|&v| self.derive_value(&[v]))
                .collect(),
            BaseFields::Vector { .. } => components[0]
                .iter()
                .zip(components[1])
                .map(|(&u, &v)| self.derive_value(&[u, v]))
                .collect(),
        };
        Ok(derived)
    }
}
