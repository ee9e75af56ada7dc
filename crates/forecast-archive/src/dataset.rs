//! Gridded dataset handles returned by an archive.

use std::fmt;

use forecast_common::{
    ArchiveField, ForecastCycle, ForecastError, ForecastResult, GridField, ParameterSpec,
    TimeAxis,
};

/// Read access to the fields of one open dataset.
///
/// Implementations return one time slice at a time, row-major on the
/// dataset's latitude × longitude axes.
pub trait FieldSource: Send + Sync {
    /// Values of `field` at `time_index`.
    fn read_slice(&self, field: ArchiveField, time_index: usize) -> ForecastResult<Vec<f32>>;

    /// Whether the dataset exposes `field`.
    fn has_field(&self, field: ArchiveField) -> bool;
}

/// Immutable handle over one forecast cycle's time × lat × lon fields.
pub struct GriddedDataset {
    cycle: ForecastCycle,
    time_axis: TimeAxis,
    lats: Vec<f64>,
    lons: Vec<f64>,
    source: Box<dyn FieldSource>,
}

impl GriddedDataset {
    pub fn new(
        cycle: ForecastCycle,
        time_axis: TimeAxis,
        lats: Vec<f64>,
        lons: Vec<f64>,
        source: Box<dyn FieldSource>,
    ) -> Self {
        Self {
            cycle,
            time_axis,
            lats,
            lons,
            source,
        }
    }

    pub fn cycle(&self) -> ForecastCycle {
        self.cycle
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn has_field(&self, field: ArchiveField) -> bool {
        self.source.has_field(field)
    }

    /// Fail with `ForecastHourOutOfRange` unless the index is on the time axis.
    pub fn validate(&self, forecast_hour_index: usize) -> ForecastResult<()> {
        self.time_axis.validate(forecast_hour_index)
    }

    /// Read one field at one forecast hour as a lat/lon grid.
    pub fn read_field(&self, field: ArchiveField, forecast_hour_index: usize) -> ForecastResult<GridField> {
        self.validate(forecast_hour_index)?;
        if !self.source.has_field(field) {
            return Err(ForecastError::data_unavailable(
                self.cycle,
                format!("dataset has no field '{}'", field),
            ));
        }

        let values = self.source.read_slice(field, forecast_hour_index)?;
        let expected = self.lats.len() * self.lons.len();
        if values.len() != expected {
            return Err(ForecastError::data_unavailable(
                self.cycle,
                format!(
                    "field '{}' has {} values at t={}, expected {}",
                    field,
                    values.len(),
                    forecast_hour_index,
                    expected
                ),
            ));
        }

        GridField::new(self.lats.clone(), self.lons.clone(), values)
    }

    /// Read every base field a parameter needs, in component order.
    pub fn read_parameter(
        &self,
        spec: &ParameterSpec,
        forecast_hour_index: usize,
    ) -> ForecastResult<Vec<GridField>> {
        spec.base_fields
            .fields()
            .into_iter()
            .map(|field| self.read_field(field, forecast_hour_index))
            .collect()
    }
}

impl fmt::Debug for GriddedDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GriddedDataset")
            .field("cycle", &self.cycle)
            .field("time_steps", &self.time_axis.len())
            .field("lats", &self.lats.len())
            .field("lons", &self.lons.len())
            .finish()
    }
}
