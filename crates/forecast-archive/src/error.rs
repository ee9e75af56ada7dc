//! Error types for reading archive datasets.

use thiserror::Error;

/// Result type for archive reads.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Failures while opening or decoding an archive dataset.
///
/// These are folded into `ForecastError::DataUnavailable` at the archive
/// boundary.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// NetCDF/DAP library error
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Time coordinate that cannot be decoded
    #[error("Unsupported time encoding: {0}")]
    TimeEncoding(String),
}
