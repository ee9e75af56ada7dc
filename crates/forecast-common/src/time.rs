//! Forecast cycles, selections and time axes.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ForecastError, ForecastResult};

/// Largest forecast-hour index a trigger may request.
pub const MAX_FORECAST_HOUR_INDEX: usize = 240;

/// Model run hours (4x daily cycles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunHour {
    /// 00Z run
    Z00,
    /// 06Z run
    Z06,
    /// 12Z run
    Z12,
    /// 18Z run
    Z18,
}

impl RunHour {
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            0 => Some(RunHour::Z00),
            6 => Some(RunHour::Z06),
            12 => Some(RunHour::Z12),
            18 => Some(RunHour::Z18),
            _ => None,
        }
    }

    /// Parse the two-digit form used by the archive ("00", "06", "12", "18").
    pub fn parse(s: &str) -> ForecastResult<Self> {
        let invalid = || {
            ForecastError::invalid_parameter("run_hour", format!("'{}' is not one of 00, 06, 12, 18", s))
        };
        if s.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = s.parse().map_err(|_| invalid())?;
        Self::from_hour(hour).ok_or_else(invalid)
    }

    pub fn hour(&self) -> u32 {
        match self {
            RunHour::Z00 => 0,
            RunHour::Z06 => 6,
            RunHour::Z12 => 12,
            RunHour::Z18 => 18,
        }
    }

    /// Two-digit hour string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunHour::Z00 => "00",
            RunHour::Z06 => "06",
            RunHour::Z12 => "12",
            RunHour::Z18 => "18",
        }
    }

    pub fn all() -> &'static [RunHour] {
        &[RunHour::Z00, RunHour::Z06, RunHour::Z12, RunHour::Z18]
    }
}

/// One model run, identified by its run date and run hour (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForecastCycle {
    pub run_date: NaiveDate,
    pub run_hour: RunHour,
}

impl ForecastCycle {
    pub fn new(run_date: NaiveDate, run_hour: RunHour) -> Self {
        Self { run_date, run_hour }
    }

    /// Parse a cycle from `YYYYMMDD` and `HH` strings.
    pub fn parse(run_date: &str, run_hour: &str) -> ForecastResult<Self> {
        if run_date.len() != 8 || !run_date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ForecastError::invalid_parameter(
                "run_date",
                format!("'{}' is not in YYYYMMDD form", run_date),
            ));
        }
        let date = NaiveDate::parse_from_str(run_date, "%Y%m%d").map_err(|e| {
            ForecastError::invalid_parameter("run_date", format!("'{}': {}", run_date, e))
        })?;
        Ok(Self::new(date, RunHour::parse(run_hour)?))
    }

    /// Run date as `YYYYMMDD`.
    pub fn date_string(&self) -> String {
        self.run_date.format("%Y%m%d").to_string()
    }

    /// Run hour as `HH`.
    pub fn hour_string(&self) -> &'static str {
        self.run_hour.as_str()
    }

    /// Model initialization time.
    pub fn init_time(&self) -> DateTime<Utc> {
        let naive = self
            .run_date
            .and_hms_opt(self.run_hour.hour(), 0, 0)
            .unwrap_or_default();
        Utc.from_utc_datetime(&naive)
    }
}

impl fmt::Display for ForecastCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}z", self.date_string(), self.hour_string())
    }
}

/// A trigger's choice of forecast cycle and lead-time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSelection {
    pub cycle: ForecastCycle,
    pub forecast_hour_index: usize,
}

impl ForecastSelection {
    /// Create a selection, bounding the index to the trigger range `[0, 240]`.
    ///
    /// Whether the index exists in a particular dataset is checked later
    /// against its time axis.
    pub fn new(cycle: ForecastCycle, forecast_hour_index: usize) -> ForecastResult<Self> {
        if forecast_hour_index > MAX_FORECAST_HOUR_INDEX {
            return Err(ForecastError::invalid_parameter(
                "forecast_hour",
                format!(
                    "{} exceeds the maximum of {}",
                    forecast_hour_index, MAX_FORECAST_HOUR_INDEX
                ),
            ));
        }
        Ok(Self {
            cycle,
            forecast_hour_index,
        })
    }
}

/// Ordered valid times of a dataset's time dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis(Vec<DateTime<Utc>>);

impl TimeAxis {
    pub fn new(times: Vec<DateTime<Utc>>) -> Self {
        Self(times)
    }

    /// Evenly spaced axis starting at `start`.
    pub fn hourly(start: DateTime<Utc>, steps: usize, step_hours: i64) -> Self {
        Self(
            (0..steps)
                .map(|i| start + chrono::Duration::hours(i as i64 * step_hours))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.0
    }

    /// Fail with `ForecastHourOutOfRange` unless `index < len`.
    pub fn validate(&self, index: usize) -> ForecastResult<()> {
        if index < self.0.len() {
            Ok(())
        } else {
            Err(ForecastError::ForecastHourOutOfRange {
                index,
                len: self.0.len(),
            })
        }
    }

    /// Valid time of the slot at `index`.
    pub fn valid_time(&self, index: usize) -> ForecastResult<DateTime<Utc>> {
        self.validate(index)?;
        Ok(self.0[index])
    }
}
