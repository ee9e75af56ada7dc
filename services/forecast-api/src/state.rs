//! Application state for the forecast API.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use forecast_archive::{DatasetSelector, ForecastArchive, OpendapArchive, UrlTemplate, VariableMap};
use forecast_common::MapTitle;
use map_renderer::{Basemap, MapRenderer, RenderOptions, TextRenderer};

use crate::config::ServiceConfig;
use crate::metrics::MetricsCollector;
use crate::pipeline::ForecastMapService;

/// Shared application state.
pub struct AppState {
    pub service: ForecastMapService,
    pub config: ServiceConfig,
    pub metrics: MetricsCollector,
}

impl AppState {
    /// State backed by the OPeNDAP archive named in `config`.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let template = UrlTemplate::new(config.archive_url_template.clone())?;
        let variables = VariableMap::gfs().with_overrides(&config.variables);
        let archive = OpendapArchive::new(template).with_variables(variables);
        Self::with_archive(config, Arc::new(archive))
    }

    /// State backed by any archive.
    pub fn with_archive(config: ServiceConfig, archive: Arc<dyn ForecastArchive>) -> Result<Self> {
        config.validate()?;
        let region = config.active_region()?.clone();

        let basemap = match &config.basemap_dir {
            Some(dir) => Basemap::load(dir),
            None => {
                warn!("BASEMAP_DIR not set, maps are drawn without land, coastline or borders");
                Basemap::empty()
            }
        };
        let text = match &config.font_path {
            Some(path) => TextRenderer::from_file(path).unwrap_or_else(|e| {
                warn!(error = %e, "Font unavailable, titles and marker labels are not drawn");
                TextRenderer::none()
            }),
            None => {
                warn!("FONT_PATH not set, titles and marker labels are not drawn");
                TextRenderer::none()
            }
        };

        let selector = DatasetSelector::new(archive, config.cache_capacity)?;
        let options = RenderOptions {
            width: config.image_width,
            height: config.image_height,
            ..RenderOptions::default()
        };
        let service = ForecastMapService::new(
            Arc::new(selector),
            Arc::new(MapRenderer::new(basemap, text)),
            region,
            MapTitle::new(config.model_name.clone()),
        )
        .with_value_ranges(config.value_ranges.clone())
        .with_options(options);

        info!(
            region = %service.region().name,
            model = %config.model_name,
            cache_capacity = config.cache_capacity,
            "Application state ready"
        );

        Ok(Self {
            service,
            config,
            metrics: MetricsCollector::new(),
        })
    }
}
