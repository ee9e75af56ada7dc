//! Common types shared by the forecast map crates.
//!
//! Holds the data model of a single-field regional forecast render: region
//! boxes and presets, forecast cycles and time axes, the closed set of
//! built-in parameters, gridded fields with their regional crop, the map
//! title format and the error taxonomy reported to callers.

pub mod error;
pub mod grid;
pub mod label;
pub mod parameter;
pub mod region;
pub mod style;
pub mod time;

pub use error::{ForecastError, ForecastResult, Severity};
pub use grid::{crop_components, finite_range, GridField, RenderedField, VectorComponents};
pub use label::{format_lead_time, format_title, format_valid_time, MapTitle};
pub use parameter::{
    ArchiveField, BaseFields, ParameterId, ParameterSpec, RenderingMode, UnitTransform,
};
pub use region::{Marker, RegionBox, RegionPreset};
pub use style::{Color, ColorScale};
pub use time::{ForecastCycle, ForecastSelection, RunHour, TimeAxis, MAX_FORECAST_HOUR_INDEX};
