//! Error types for forecast map rendering.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using ForecastError.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// How a failure is presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Primary error type for forecast map requests.
///
/// Every variant is terminal for the request that raised it.
#[derive(Debug, Error)]
pub enum ForecastError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Unknown region preset: {0}")]
    UnknownRegion(String),

    // === Data Errors ===
    #[error("Data unavailable for cycle {cycle}: {message}")]
    DataUnavailable { cycle: String, message: String },

    #[error("Forecast hour index {index} out of range: time axis has {len} steps")]
    ForecastHourOutOfRange { index: usize, len: usize },

    #[error("Region '{region}' does not intersect the dataset grid")]
    EmptyRegion { region: String },

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ForecastError {
    /// Build a `DataUnavailable` error for the given cycle label.
    pub fn data_unavailable(cycle: impl ToString, message: impl ToString) -> Self {
        ForecastError::DataUnavailable {
            cycle: cycle.to_string(),
            message: message.to_string(),
        }
    }

    /// Build an `InvalidParameter` error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        ForecastError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ForecastError::MissingParameter(_) => "MissingParameter",
            ForecastError::InvalidParameter { .. } => "InvalidParameter",
            ForecastError::UnknownParameter(_) => "UnknownParameter",
            ForecastError::UnknownRegion(_) => "UnknownRegion",
            ForecastError::DataUnavailable { .. } => "DataUnavailable",
            ForecastError::ForecastHourOutOfRange { .. } => "ForecastHourOutOfRange",
            ForecastError::EmptyRegion { .. } => "EmptyRegion",
            ForecastError::Configuration(_) => "Configuration",
            ForecastError::RenderError(_) => "RenderError",
            ForecastError::InternalError(_) => "InternalError",
        }
    }

    /// Unknown parameters are reported as warnings, everything else as errors.
    pub fn severity(&self) -> Severity {
        match self {
            ForecastError::UnknownParameter(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ForecastError::MissingParameter(_)
            | ForecastError::InvalidParameter { .. }
            | ForecastError::UnknownParameter(_) => 400,

            ForecastError::ForecastHourOutOfRange { .. } | ForecastError::EmptyRegion { .. } => {
                422
            }

            ForecastError::DataUnavailable { .. } => 502,

            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_for_taxonomy() {
        let errors = [
            ForecastError::data_unavailable("20250101/00z", "unreachable"),
            ForecastError::ForecastHourOutOfRange { index: 240, len: 240 },
            ForecastError::UnknownParameter("unknown_field".to_string()),
            ForecastError::EmptyRegion {
                region: "jakarta".to_string(),
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.error_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_unknown_parameter_is_warning() {
        let err = ForecastError::UnknownParameter("x".to_string());
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(err.http_status_code(), 400);

        let err = ForecastError::ForecastHourOutOfRange { index: 5, len: 3 };
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_out_of_range_message() {
        let err = ForecastError::ForecastHourOutOfRange { index: 240, len: 240 };
        assert_eq!(
            err.to_string(),
            "Forecast hour index 240 out of range: time axis has 240 steps"
        );
    }
}
