//! The archive seam and its URL addressing.

use forecast_common::{ForecastCycle, ForecastError, ForecastResult};

use crate::dataset::GriddedDataset;

/// A remotely hosted store of forecast cycles.
///
/// `open` is blocking and may hit the network. Callers on an async runtime
/// run it on a blocking thread.
pub trait ForecastArchive: Send + Sync {
    /// Open the dataset for one cycle.
    ///
    /// Fails with `DataUnavailable` when the cycle cannot be reached or
    /// parsed.
    fn open(&self, cycle: &ForecastCycle) -> ForecastResult<GriddedDataset>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Default GFS 0.25° OPeNDAP address on NOMADS.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://nomads.ncep.noaa.gov/dods/gfs_0p25/gfs{date}/gfs_0p25_{hour}z";

/// Dataset address parameterized by `{date}` (`YYYYMMDD`) and `{hour}` (`HH`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> ForecastResult<Self> {
        let template = template.into();
        for placeholder in ["{date}", "{hour}"] {
            if !template.contains(placeholder) {
                return Err(ForecastError::Configuration(format!(
                    "archive URL template '{}' lacks {}",
                    template, placeholder
                )));
            }
        }
        Ok(Self(template))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address of the dataset for `cycle`.
    pub fn resolve(&self, cycle: &ForecastCycle) -> String {
        self.0
            .replace("{date}", &cycle.date_string())
            .replace("{hour}", cycle.hour_string())
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        Self(DEFAULT_URL_TEMPLATE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_template() {
        let cycle = ForecastCycle::parse("20250101", "06").unwrap();
        assert_eq!(
            UrlTemplate::default().resolve(&cycle),
            "https://nomads.ncep.noaa.gov/dods/gfs_0p25/gfs20250101/gfs_0p25_06z"
        );
    }

    #[test]
    fn test_template_requires_placeholders() {
        assert!(UrlTemplate::new("https://example.org/{date}").is_err());
        assert!(UrlTemplate::new("file:///data/{date}_{hour}.nc").is_ok());
    }
}
