//! Map title formatting.
//!
//! The title layout `"{label} • Valid: {valid} • {model} {lead}"` is parsed
//! by downstream consumers and must stay stable.

use chrono::{DateTime, Utc};

use crate::error::ForecastResult;
use crate::time::TimeAxis;

/// Separator between title segments.
pub const TITLE_SEPARATOR: &str = " • ";

/// Valid time as `HHUTC Weekday, DD Mon YYYY`, e.g. `06UTC Wed, 01 Jan 2025`.
pub fn format_valid_time(valid_time: &DateTime<Utc>) -> String {
    valid_time.format("%HUTC %a, %d %b %Y").to_string()
}

/// Lead time as `t+NNN`.
pub fn format_lead_time(forecast_hour_index: usize) -> String {
    format!("t+{:03}", forecast_hour_index)
}

pub fn format_title(label: &str, valid_time: &str, model_name: &str, lead_time: &str) -> String {
    format!(
        "{label}{sep}Valid: {valid_time}{sep}{model_name} {lead_time}",
        sep = TITLE_SEPARATOR
    )
}

/// Builds map titles for one model.
#[derive(Debug, Clone)]
pub struct MapTitle {
    model_name: String,
}

impl MapTitle {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Title for `label` at `forecast_hour_index` on `time_axis`.
    ///
    /// Fails with `ForecastHourOutOfRange` if the index is not on the axis.
    pub fn format(
        &self,
        label: &str,
        forecast_hour_index: usize,
        time_axis: &TimeAxis,
    ) -> ForecastResult<String> {
        let valid_time = time_axis.valid_time(forecast_hour_index)?;
        Ok(format_title(
            label,
            &format_valid_time(&valid_time),
            &self.model_name,
            &format_lead_time(forecast_hour_index),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_valid_time() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap();
        assert_eq!(format_valid_time(&t), "06UTC Wed, 01 Jan 2025");
    }

    #[test]
    fn test_format_lead_time_pads() {
        assert_eq!(format_lead_time(0), "t+000");
        assert_eq!(format_lead_time(7), "t+007");
        assert_eq!(format_lead_time(240), "t+240");
    }

    #[test]
    fn test_map_title() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let axis = TimeAxis::hourly(start, 4, 3);
        let title = MapTitle::new("GFS")
            .format("Surface Temperature (°C)", 3, &axis)
            .unwrap();
        assert_eq!(
            title,
            "Surface Temperature (°C) • Valid: 09UTC Wed, 01 Jan 2025 • GFS t+003"
        );
    }

    #[test]
    fn test_map_title_out_of_range() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let axis = TimeAxis::hourly(start, 2, 1);
        assert!(MapTitle::new("GFS").format("x", 2, &axis).is_err());
    }
}
