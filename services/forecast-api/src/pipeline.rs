//! The render pipeline behind `/render`.
//!
//! One request runs: resolve parameter → select dataset → validate index →
//! read and crop the base field(s) → derive → format title → render. A
//! failing step ends the request with its error; nothing later runs.

use std::collections::HashMap;
use std::sync::Arc;

use forecast_archive::DatasetSelector;
use forecast_common::{
    crop_components, ForecastError, ForecastResult, ForecastSelection, MapTitle, ParameterId,
    ParameterSpec, RegionPreset, RenderedField,
};
use map_renderer::{MapArtifact, MapRenderer, RenderOptions};
use tracing::{debug, info};

/// One trigger of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub selection: ForecastSelection,
    /// Parameter identifier as supplied by the caller
    pub parameter: String,
    /// Draw contour lines over the primary layer
    pub contours: bool,
}

/// The cropped, derived field with its title, ready to draw.
#[derive(Debug, Clone)]
pub struct PreparedField {
    pub spec: ParameterSpec,
    pub field: RenderedField,
    pub title: String,
}

/// A finished map.
#[derive(Debug, Clone)]
pub struct ForecastMap {
    pub artifact: MapArtifact,
    pub spec: ParameterSpec,
    pub selection: ForecastSelection,
}

/// Renders forecast maps for one region preset.
pub struct ForecastMapService {
    selector: Arc<DatasetSelector>,
    renderer: Arc<MapRenderer>,
    region: RegionPreset,
    title: MapTitle,
    value_ranges: HashMap<ParameterId, Option<(f32, f32)>>,
    options: RenderOptions,
}

impl ForecastMapService {
    pub fn new(
        selector: Arc<DatasetSelector>,
        renderer: Arc<MapRenderer>,
        region: RegionPreset,
        title: MapTitle,
    ) -> Self {
        Self {
            selector,
            renderer,
            region,
            title,
            value_ranges: HashMap::new(),
            options: RenderOptions::default(),
        }
    }

    /// Replace the color range of the listed parameters.
    pub fn with_value_ranges(mut self, value_ranges: HashMap<ParameterId, Option<(f32, f32)>>) -> Self {
        self.value_ranges = value_ranges;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn selector(&self) -> &DatasetSelector {
        &self.selector
    }

    pub fn region(&self) -> &RegionPreset {
        &self.region
    }

    /// Spec for `parameter_id` with this deployment's color range applied.
    pub fn resolve(&self, parameter_id: &str) -> ForecastResult<ParameterSpec> {
        let spec = ParameterSpec::resolve(parameter_id)?;
        Ok(match self.value_ranges.get(&spec.id) {
            Some(range) => spec.with_value_range(*range),
            None => spec,
        })
    }

    /// All built-in parameters as this deployment draws them.
    pub fn parameters(&self) -> Vec<ParameterSpec> {
        ParameterId::ALL
            .into_iter()
            .map(|id| {
                let spec = id.spec();
                match self.value_ranges.get(&id) {
                    Some(range) => spec.with_value_range(*range),
                    None => spec,
                }
            })
            .collect()
    }

    /// Run every step up to and including the title.
    pub async fn prepare(&self, request: &RenderRequest) -> ForecastResult<PreparedField> {
        // Unknown parameters fail here, before the archive is touched
        let spec = self.resolve(&request.parameter)?;

        let dataset = self.selector.select(&request.selection.cycle).await?;
        let index = request.selection.forecast_hour_index;
        dataset.validate(index)?;

        let region = self.region.bbox;
        let title = self.title.clone();
        tokio::task::spawn_blocking(move || {
            let components = dataset.read_parameter(&spec, index)?;
            let cropped = crop_components(&components, &region)?;
            let field = RenderedField::from_components(&spec, cropped)?;
            let title = title.format(spec.label, index, dataset.time_axis())?;

            debug!(
                parameter = %spec.id,
                rows = field.height(),
                cols = field.width(),
                range = ?field.value_range(),
                "Prepared field"
            );
            Ok(PreparedField { spec, field, title })
        })
        .await
        .map_err(|e| ForecastError::InternalError(format!("field task failed: {}", e)))?
    }

    /// Run the whole pipeline and return the finished map.
    pub async fn render(&self, request: &RenderRequest) -> ForecastResult<ForecastMap> {
        let PreparedField { spec, field, title } = self.prepare(request).await?;

        let renderer = self.renderer.clone();
        let region = self.region.clone();
        let options = RenderOptions {
            contour_overlay: request.contours,
            ..self.options.clone()
        };
        let artifact = tokio::task::spawn_blocking(move || {
            renderer.render(&field, &spec, &region.bbox, &region.marker, &title, &options)
        })
        .await
        .map_err(|e| ForecastError::InternalError(format!("render task failed: {}", e)))??;

        info!(
            cycle = %request.selection.cycle,
            forecast_hour = request.selection.forecast_hour_index,
            parameter = %spec.id,
            region = %self.region.name,
            bytes = artifact.png.len(),
            "Rendered forecast map"
        );

        Ok(ForecastMap {
            artifact,
            spec,
            selection: request.selection,
        })
    }
}
