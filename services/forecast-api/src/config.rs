//! Service configuration.
//!
//! Settings are read from environment variables and may be overlaid by a
//! YAML deployment file. The deployment file is also where region presets
//! beyond the built-in ones, per-parameter color ranges and archive
//! variable names are configured.

use anyhow::{bail, Context, Result};
use forecast_archive::{DEFAULT_CACHE_CAPACITY, DEFAULT_URL_TEMPLATE};
use forecast_common::{ArchiveField, ParameterId, RegionPreset};
use map_renderer::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Resolved configuration of one deployment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub archive_url_template: String,
    /// Model name shown in map titles
    pub model_name: String,
    /// Name of the active region preset
    pub region: String,
    pub cache_capacity: usize,
    pub font_path: Option<PathBuf>,
    pub basemap_dir: Option<PathBuf>,
    pub image_width: u32,
    pub image_height: u32,
    /// Built-in presets followed by deployment-defined ones
    pub regions: Vec<RegionPreset>,
    /// Color range overrides; `None` switches a parameter to data scaling
    pub value_ranges: HashMap<ParameterId, Option<(f32, f32)>>,
    /// Archive variable names replacing the GFS defaults
    pub variables: HashMap<ArchiveField, String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            archive_url_template: DEFAULT_URL_TEMPLATE.to_string(),
            model_name: "GFS".to_string(),
            region: "jakarta".to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            font_path: None,
            basemap_dir: None,
            image_width: DEFAULT_WIDTH,
            image_height: DEFAULT_HEIGHT,
            regions: RegionPreset::builtin(),
            value_ranges: HashMap::new(),
            variables: HashMap::new(),
        }
    }
}

/// Contents of the optional YAML deployment file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploymentFile {
    pub archive_url_template: Option<String>,
    pub model_name: Option<String>,
    pub region: Option<String>,
    pub cache_capacity: Option<usize>,
    pub font_path: Option<PathBuf>,
    pub basemap_dir: Option<PathBuf>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub regions: Vec<RegionPreset>,
    pub value_ranges: HashMap<ParameterId, Option<(f32, f32)>>,
    pub variables: HashMap<ArchiveField, String>,
}

impl ServiceConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(template) = lookup("ARCHIVE_URL_TEMPLATE") {
            config.archive_url_template = template;
        }
        if let Some(model) = lookup("MODEL_NAME") {
            config.model_name = model;
        }
        if let Some(region) = lookup("REGION") {
            config.region = region;
        }
        config.font_path = lookup("FONT_PATH").map(PathBuf::from);
        config.basemap_dir = lookup("BASEMAP_DIR").map(PathBuf::from);

        config.cache_capacity = parse_var(&lookup, "DATASET_CACHE_CAPACITY", config.cache_capacity)?;
        config.image_width = parse_var(&lookup, "IMAGE_WIDTH", config.image_width)?;
        config.image_height = parse_var(&lookup, "IMAGE_HEIGHT", config.image_height)?;

        Ok(config)
    }

    /// Overlay the YAML deployment file at `path`.
    pub fn load_file(mut self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        let file: DeploymentFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse deployment file: {:?}", path))?;

        info!(
            path = %path.display(),
            regions = file.regions.len(),
            value_ranges = file.value_ranges.len(),
            "Loaded deployment file"
        );
        self.apply(file);
        Ok(self)
    }

    /// Overlay deployment settings. Regions with a built-in name replace it.
    pub fn apply(&mut self, file: DeploymentFile) {
        if let Some(v) = file.archive_url_template {
            self.archive_url_template = v;
        }
        if let Some(v) = file.model_name {
            self.model_name = v;
        }
        if let Some(v) = file.region {
            self.region = v;
        }
        if let Some(v) = file.cache_capacity {
            self.cache_capacity = v;
        }
        if file.font_path.is_some() {
            self.font_path = file.font_path;
        }
        if file.basemap_dir.is_some() {
            self.basemap_dir = file.basemap_dir;
        }
        if let Some(v) = file.image_width {
            self.image_width = v;
        }
        if let Some(v) = file.image_height {
            self.image_height = v;
        }

        for region in file.regions {
            match self.regions.iter_mut().find(|r| r.name == region.name) {
                Some(existing) => *existing = region,
                None => self.regions.push(region),
            }
        }
        self.value_ranges.extend(file.value_ranges);
        self.variables.extend(file.variables);
    }

    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            bail!("DATASET_CACHE_CAPACITY must be at least 1");
        }
        if self.image_width == 0 || self.image_height == 0 {
            bail!(
                "image size {}x{} must be non-zero",
                self.image_width,
                self.image_height
            );
        }
        for region in &self.regions {
            region
                .bbox
                .validate()
                .with_context(|| format!("region preset '{}'", region.name))?;
        }
        for (id, range) in &self.value_ranges {
            if let Some((min, max)) = range {
                if !min.is_finite() || !max.is_finite() || min >= max {
                    bail!("value range for {} must have min < max, got [{}, {}]", id, min, max);
                }
            }
        }
        self.active_region()?;
        Ok(())
    }

    /// The preset named by `region`.
    pub fn active_region(&self) -> Result<&RegionPreset> {
        Ok(RegionPreset::find(&self.regions, &self.region)?)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}='{}' is invalid: {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.model_name, "GFS");
        assert_eq!(config.region, "jakarta");
        assert_eq!(config.cache_capacity, 16);
        assert_eq!((config.image_width, config.image_height), (1000, 800));
        assert!(config.font_path.is_none());
        assert_eq!(config.regions.len(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("MODEL_NAME", "GFS 0.25"),
            ("REGION", "kemayoran"),
            ("DATASET_CACHE_CAPACITY", "4"),
            ("IMAGE_WIDTH", "640"),
            ("BASEMAP_DIR", "/srv/basemap"),
        ]))
        .unwrap();

        assert_eq!(config.model_name, "GFS 0.25");
        assert_eq!(config.active_region().unwrap().name, "kemayoran");
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.image_width, 640);
        assert_eq!(config.basemap_dir, Some(PathBuf::from("/srv/basemap")));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("IMAGE_HEIGHT", "tall")])).unwrap_err();
        assert!(err.to_string().contains("IMAGE_HEIGHT"));
    }

    #[test]
    fn test_unknown_region_fails_validation() {
        let config = ServiceConfig::from_lookup(lookup_from(&[("REGION", "bandung")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cache_capacity_fails_validation() {
        let config =
            ServiceConfig::from_lookup(lookup_from(&[("DATASET_CACHE_CAPACITY", "0")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deployment_file_overlay() {
        let yaml = r#"
model_name: GFS-JKT
region: bogor
regions:
  - name: bogor
    description: Bogor city view
    box: { lat_min: -6.7, lat_max: -6.5, lon_min: 106.7, lon_max: 106.9 }
    marker: { name: Bogor, lat: -6.595, lon: 106.8 }
  - name: jakarta
    description: Narrow Jakarta view
    box: { lat_min: -6.3, lat_max: -6.0, lon_min: 106.7, lon_max: 107.0 }
    marker: { name: Kemayoran, lat: -6.1744, lon: 106.865 }
value_ranges:
  surface_temperature: [20.0, 35.0]
  precipitation_rate: ~
variables:
  temperature_2m: t2m
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = ServiceConfig::default().load_file(file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.model_name, "GFS-JKT");
        let region = config.active_region().unwrap();
        assert_eq!(region.marker.name, "Bogor");
        assert_eq!(region.marker.label_offset, 0.015);

        // Four presets: three built-in (one replaced) and bogor
        assert_eq!(config.regions.len(), 4);
        let jakarta = RegionPreset::find(&config.regions, "jakarta").unwrap();
        assert_eq!(jakarta.bbox.lat_min, -6.3);

        assert_eq!(
            config.value_ranges.get(&ParameterId::SurfaceTemperature),
            Some(&Some((20.0, 35.0)))
        );
        assert_eq!(config.value_ranges.get(&ParameterId::PrecipitationRate), Some(&None));
        assert_eq!(
            config.variables.get(&ArchiveField::Temperature2m).map(String::as_str),
            Some("t2m")
        );
    }

    #[test]
    fn test_deployment_file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"colour_map: viridis\n").unwrap();
        assert!(ServiceConfig::default().load_file(file.path()).is_err());
    }

    #[test]
    fn test_inverted_value_range_fails_validation() {
        let mut config = ServiceConfig::default();
        config
            .value_ranges
            .insert(ParameterId::SurfaceWind, Some((50.0, 0.0)));
        assert!(config.validate().is_err());
    }
}
