//! Gridded lat/lon fields and the regional crop applied before rendering.

use serde::Serialize;

use crate::error::{ForecastError, ForecastResult};
use crate::parameter::{BaseFields, ParameterSpec};
use crate::region::RegionBox;

/// A 2-D field on latitude/longitude axes.
///
/// Values are row-major: row `i` follows `lats[i]`, column `j` follows
/// `lons[j]`. Axes keep the order of the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridField {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub values: Vec<f32>,
}

impl GridField {
    /// Create a field, checking that `values` matches the axis lengths.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, values: Vec<f32>) -> ForecastResult<Self> {
        if values.len() != lats.len() * lons.len() {
            return Err(ForecastError::InternalError(format!(
                "field has {} values for a {}x{} grid",
                values.len(),
                lats.len(),
                lons.len()
            )));
        }
        Ok(Self { lats, lons, values })
    }

    /// Number of columns (longitude points).
    pub fn width(&self) -> usize {
        self.lons.len()
    }

    /// Number of rows (latitude points).
    pub fn height(&self) -> usize {
        self.lats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lats.is_empty() || self.lons.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.values.get(row * self.width() + col).copied()
    }

    /// Minimum and maximum of the non-NaN values.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        finite_range(&self.values)
    }

    /// Keep the rows and columns whose coordinates fall inside `region`.
    ///
    /// Boundary points are kept. Fails with `EmptyRegion` when no row or no
    /// column survives.
    pub fn crop(&self, region: &RegionBox) -> ForecastResult<GridField> {
        let rows: Vec<usize> = axis_indices(&self.lats, |lat| region.contains_lat(lat));
        let cols: Vec<usize> = axis_indices(&self.lons, |lon| region.contains_lon(lon));

        if rows.is_empty() || cols.is_empty() {
            return Err(ForecastError::EmptyRegion {
                region: region.to_string(),
            });
        }

        let width = self.width();
        let mut values = Vec::with_capacity(rows.len() * cols.len());
        for &row in &rows {
            let offset = row * width;
            values.extend(cols.iter().map(|&col| self.values[offset + col]));
        }

        Ok(GridField {
            lats: rows.iter().map(|&i| self.lats[i]).collect(),
            lons: cols.iter().map(|&j| self.lons[j]).collect(),
            values,
        })
    }
}

fn axis_indices(axis: &[f64], keep: impl Fn(f64) -> bool) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, &v)| keep(v))
        .map(|(i, _)| i)
        .collect()
}

/// Minimum and maximum of the non-NaN values of a slice.
pub fn finite_range(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Crop every component with the same region, keeping them co-indexed.
pub fn crop_components(fields: &[GridField], region: &RegionBox) -> ForecastResult<Vec<GridField>> {
    let cropped = fields
        .iter()
        .map(|f| f.crop(region))
        .collect::<ForecastResult<Vec<_>>>()?;

    if let Some(first) = cropped.first() {
        let aligned = cropped
            .iter()
            .all(|c| c.lats == first.lats && c.lons == first.lons);
        if !aligned {
            return Err(ForecastError::InternalError(
                "component fields are not on the same grid".to_string(),
            ));
        }
    }
    Ok(cropped)
}

/// Raw eastward/northward components kept for the arrow overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorComponents {
    pub u: Vec<f32>,
    pub v: Vec<f32>,
}

/// The cropped, derived field handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Derived physical values, row-major on `lats` × `lons`
    pub values: Vec<f32>,
    /// Raw components for vector parameters
    pub vector: Option<VectorComponents>,
}

impl RenderedField {
    /// Derive the display field from cropped, co-indexed components.
    pub fn from_components(spec: &ParameterSpec, components: Vec<GridField>) -> ForecastResult<Self> {
        let slices: Vec<&[f32]> = components.iter().map(|c| c.values.as_slice()).collect();
        let values = spec.derive(&slices)?;

        let mut components = components.into_iter();
        let first = components
            .next()
            .ok_or_else(|| ForecastError::InternalError("no component fields".to_string()))?;

        let vector = match spec.base_fields {
            BaseFields::Scalar(_) => None,
            BaseFields::Vector { .. } => {
                let v = components.next().ok_or_else(|| {
                    ForecastError::InternalError("missing v component".to_string())
                })?;
                Some(VectorComponents {
                    u: first.values.clone(),
                    v: v.values,
                })
            }
        };

        Ok(Self {
            lats: first.lats,
            lons: first.lons,
            values,
            vector,
        })
    }

    pub fn width(&self) -> usize {
        self.lons.len()
    }

    pub fn height(&self) -> usize {
        self.lats.len()
    }

    /// Minimum and maximum of the non-NaN derived values.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        finite_range(&self.values)
    }
}
