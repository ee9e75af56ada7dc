//! Forecast archive access.
//!
//! Opens the gridded dataset of a forecast cycle from a remote archive and
//! memoizes the handles per cycle:
//!
//! - [`ForecastArchive`]: the archive seam, implemented by
//!   [`OpendapArchive`] (libnetcdf over DAP) and [`MemoryArchive`]
//! - [`GriddedDataset`]: time axis, lat/lon axes and lazily read fields
//! - [`DatasetSelector`]: per-cycle LRU of opened datasets

pub mod archive;
pub mod cf_time;
pub mod dataset;
pub mod error;
pub mod memory;
pub mod opendap;
pub mod selector;

pub use archive::{ForecastArchive, UrlTemplate, DEFAULT_URL_TEMPLATE};
pub use dataset::{FieldSource, GriddedDataset};
pub use error::{ArchiveError, ArchiveResult};
pub use memory::{DatasetSnapshot, MemoryArchive};
pub use opendap::{CoordinateNames, OpendapArchive, VariableMap};
pub use selector::{DatasetSelector, SelectorStats, DEFAULT_CACHE_CAPACITY};
