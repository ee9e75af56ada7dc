//! NetCDF/OPeNDAP archive backed by libnetcdf.
//!
//! Opening a dataset reads only the coordinate variables. Field values are
//! fetched one time slice at a time when a render asks for them.

use std::collections::HashMap;
use std::sync::Mutex;

use forecast_common::{ArchiveField, ForecastCycle, ForecastError, ForecastResult, TimeAxis};
use tracing::{debug, info};

use crate::archive::{ForecastArchive, UrlTemplate};
use crate::cf_time::decode_times;
use crate::dataset::{FieldSource, GriddedDataset};
use crate::error::{ArchiveError, ArchiveResult};

/// Archive variable names for each logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMap(HashMap<ArchiveField, String>);

impl VariableMap {
    /// Names used by the GFS 0.25° GrADS server.
    pub fn gfs() -> Self {
        Self(
            ArchiveField::ALL
                .into_iter()
                .map(|f| (f, f.gfs_variable().to_string()))
                .collect(),
        )
    }

    /// Replace the names given in `overrides`.
    pub fn with_overrides(mut self, overrides: &HashMap<ArchiveField, String>) -> Self {
        for (field, name) in overrides {
            self.0.insert(*field, name.clone());
        }
        self
    }

    pub fn get(&self, field: ArchiveField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }
}

impl Default for VariableMap {
    fn default() -> Self {
        Self::gfs()
    }
}

/// Names of the coordinate variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateNames {
    pub time: String,
    pub lat: String,
    pub lon: String,
}

impl Default for CoordinateNames {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            lat: "lat".to_string(),
            lon: "lon".to_string(),
        }
    }
}

/// Archive reached through libnetcdf, over DAP or from local files.
#[derive(Debug, Clone)]
pub struct OpendapArchive {
    template: UrlTemplate,
    variables: VariableMap,
    coordinates: CoordinateNames,
}

impl OpendapArchive {
    pub fn new(template: UrlTemplate) -> Self {
        Self {
            template,
            variables: VariableMap::default(),
            coordinates: CoordinateNames::default(),
        }
    }

    pub fn with_variables(mut self, variables: VariableMap) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_coordinates(mut self, coordinates: CoordinateNames) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    fn open_dataset(&self, cycle: &ForecastCycle, url: &str) -> ArchiveResult<GriddedDataset> {
        let file = netcdf::open(url)?;

        let time_var = file
            .variable(&self.coordinates.time)
            .ok_or_else(|| ArchiveError::MissingData(format!("{} variable", self.coordinates.time)))?;
        let raw_times: Vec<f64> = time_var.get_values::<f64, _>(..)?;
        let units = get_string_attr(&time_var, "units")
            .ok_or_else(|| ArchiveError::MissingData("time units attribute".to_string()))?;
        let calendar = get_string_attr(&time_var, "calendar");
        let times = decode_times(&raw_times, &units, calendar.as_deref())?;

        let lats = read_coordinate(&file, &self.coordinates.lat)?;
        let lons = read_coordinate(&file, &self.coordinates.lon)?;

        let mut variables = HashMap::new();
        for field in ArchiveField::ALL {
            let Some(name) = self.variables.get(field) else {
                continue;
            };
            let Some(var) = file.variable(name) else {
                debug!(field = %field, variable = name, "Variable not present in dataset");
                continue;
            };
            let dims = var.dimensions();
            if dims.len() != 3 {
                return Err(ArchiveError::InvalidFormat(format!(
                    "variable {} has {} dimensions, expected time x lat x lon",
                    name,
                    dims.len()
                )));
            }
            let fill = get_f32_attr(&var, "_FillValue");
            let missing = get_f32_attr(&var, "missing_value");
            variables.insert(
                field,
                VariableInfo {
                    name: name.to_string(),
                    fill_values: [fill, missing].into_iter().flatten().collect(),
                },
            );
        }
        drop(time_var);

        info!(
            cycle = %cycle,
            url = url,
            time_steps = times.len(),
            lats = lats.len(),
            lons = lons.len(),
            fields = variables.len(),
            "Opened archive dataset"
        );

        let source = NetCdfSource {
            cycle: *cycle,
            file: Mutex::new(file),
            variables,
        };
        Ok(GriddedDataset::new(
            *cycle,
            TimeAxis::new(times),
            lats,
            lons,
            Box::new(source),
        ))
    }
}

impl ForecastArchive for OpendapArchive {
    fn open(&self, cycle: &ForecastCycle) -> ForecastResult<GriddedDataset> {
        let url = self.template.resolve(cycle);
        self.open_dataset(cycle, &url)
            .map_err(|e| ForecastError::data_unavailable(cycle, format!("{}: {}", url, e)))
    }

    fn name(&self) -> &str {
        "opendap"
    }
}

#[derive(Debug, Clone)]
struct VariableInfo {
    name: String,
    fill_values: Vec<f32>,
}

struct NetCdfSource {
    cycle: ForecastCycle,
    file: Mutex<netcdf::File>,
    variables: HashMap<ArchiveField, VariableInfo>,
}

impl FieldSource for NetCdfSource {
    fn read_slice(&self, field: ArchiveField, time_index: usize) -> ForecastResult<Vec<f32>> {
        let info = self.variables.get(&field).ok_or_else(|| {
            ForecastError::InternalError(format!("field '{}' is not mapped", field))
        })?;
        let file = self
            .file
            .lock()
            .map_err(|_| ForecastError::InternalError("dataset lock poisoned".to_string()))?;
        let var = file.variable(&info.name).ok_or_else(|| {
            ForecastError::InternalError(format!("variable '{}' disappeared", info.name))
        })?;

        let mut values: Vec<f32> = var
            .get_values::<f32, _>((time_index, .., ..))
            .map_err(|e| {
                ForecastError::data_unavailable(self.cycle, format!("reading {}: {}", info.name, e))
            })?;

        for v in values.iter_mut() {
            if info.fill_values.iter().any(|fill| *v == *fill) {
                *v = f32::NAN;
            }
        }
        debug!(field = %field, variable = %info.name, time_index, "Read field slice");
        Ok(values)
    }

    fn has_field(&self, field: ArchiveField) -> bool {
        self.variables.contains_key(&field)
    }
}

fn read_coordinate(file: &netcdf::File, name: &str) -> ArchiveResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| ArchiveError::MissingData(format!("{} variable", name)))?;
    let values: Vec<f64> = var.get_values::<f64, _>(..)?;
    if values.is_empty() {
        return Err(ArchiveError::InvalidFormat(format!("{} axis is empty", name)));
    }
    Ok(values)
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
