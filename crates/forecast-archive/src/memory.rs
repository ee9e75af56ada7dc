//! In-process archive holding dataset snapshots.
//!
//! Used for tests and offline rendering. Every `open` is counted so callers
//! can check how often the archive was hit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use forecast_common::{ArchiveField, ForecastCycle, ForecastError, ForecastResult, TimeAxis};

use crate::archive::ForecastArchive;
use crate::dataset::{FieldSource, GriddedDataset};

/// Full contents of one dataset: axes plus time × lat × lon fields.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    pub time_axis: TimeAxis,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    fields: HashMap<ArchiveField, Vec<f32>>,
}

impl DatasetSnapshot {
    pub fn new(time_axis: TimeAxis, lats: Vec<f64>, lons: Vec<f64>) -> Self {
        Self {
            time_axis,
            lats,
            lons,
            fields: HashMap::new(),
        }
    }

    fn plane_len(&self) -> usize {
        self.lats.len() * self.lons.len()
    }

    /// Add a field laid out time-major (`values[t][lat][lon]` flattened).
    pub fn with_field(mut self, field: ArchiveField, values: Vec<f32>) -> ForecastResult<Self> {
        let expected = self.time_axis.len() * self.plane_len();
        if values.len() != expected {
            return Err(ForecastError::InternalError(format!(
                "field '{}' has {} values, expected {}",
                field,
                values.len(),
                expected
            )));
        }
        self.fields.insert(field, values);
        Ok(self)
    }

    /// Add a field whose value at every time step comes from `f(t, lat, lon)`.
    pub fn with_field_fn(
        self,
        field: ArchiveField,
        f: impl Fn(usize, f64, f64) -> f32,
    ) -> ForecastResult<Self> {
        let mut values = Vec::with_capacity(self.time_axis.len() * self.plane_len());
        for t in 0..self.time_axis.len() {
            for &lat in &self.lats {
                for &lon in &self.lons {
                    values.push(f(t, lat, lon));
                }
            }
        }
        self.with_field(field, values)
    }
}

struct SnapshotSource(Arc<DatasetSnapshot>);

impl FieldSource for SnapshotSource {
    fn read_slice(&self, field: ArchiveField, time_index: usize) -> ForecastResult<Vec<f32>> {
        let plane = self.0.plane_len();
        let values = self
            .0
            .fields
            .get(&field)
            .ok_or_else(|| ForecastError::InternalError(format!("no field '{}'", field)))?;
        let start = time_index * plane;
        values
            .get(start..start + plane)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| {
                ForecastError::InternalError(format!("time index {} beyond '{}'", time_index, field))
            })
    }

    fn has_field(&self, field: ArchiveField) -> bool {
        self.0.fields.contains_key(&field)
    }
}

/// Archive backed by in-memory snapshots keyed by cycle.
#[derive(Default)]
pub struct MemoryArchive {
    datasets: RwLock<HashMap<ForecastCycle, Arc<DatasetSnapshot>>>,
    opens: AtomicU64,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or replace) the dataset for `cycle`.
    pub fn insert(&self, cycle: ForecastCycle, snapshot: DatasetSnapshot) {
        if let Ok(mut datasets) = self.datasets.write() {
            datasets.insert(cycle, Arc::new(snapshot));
        }
    }

    /// Withdraw the dataset for `cycle`.
    pub fn remove(&self, cycle: &ForecastCycle) {
        if let Ok(mut datasets) = self.datasets.write() {
            datasets.remove(cycle);
        }
    }

    /// Number of `open` calls so far, successful or not.
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ForecastArchive for MemoryArchive {
    fn open(&self, cycle: &ForecastCycle) -> ForecastResult<GriddedDataset> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let snapshot = self
            .datasets
            .read()
            .map_err(|_| ForecastError::InternalError("archive lock poisoned".to_string()))?
            .get(cycle)
            .cloned()
            .ok_or_else(|| ForecastError::data_unavailable(cycle, "cycle not published"))?;

        Ok(GriddedDataset::new(
            *cycle,
            snapshot.time_axis.clone(),
            snapshot.lats.clone(),
            snapshot.lons.clone(),
            Box::new(SnapshotSource(snapshot)),
        ))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot() -> DatasetSnapshot {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        DatasetSnapshot::new(TimeAxis::hourly(start, 3, 1), vec![-6.5, -6.0], vec![106.5, 107.0])
            .with_field_fn(ArchiveField::Temperature2m, |t, _, lon| t as f32 * 100.0 + lon as f32)
            .unwrap()
    }

    #[test]
    fn test_open_reads_time_slice() {
        let archive = MemoryArchive::new();
        let cycle = ForecastCycle::parse("20250101", "00").unwrap();
        archive.insert(cycle, snapshot());

        let dataset = archive.open(&cycle).unwrap();
        let field = dataset.read_field(ArchiveField::Temperature2m, 2).unwrap();
        assert_eq!(field.values, vec![306.5, 307.0, 306.5, 307.0]);
        assert_eq!(archive.open_count(), 1);
    }

    #[test]
    fn test_missing_cycle_is_unavailable() {
        let archive = MemoryArchive::new();
        let cycle = ForecastCycle::parse("20250101", "12").unwrap();
        assert!(matches!(
            archive.open(&cycle),
            Err(ForecastError::DataUnavailable { .. })
        ));
        assert_eq!(archive.open_count(), 1);
    }

    #[test]
    fn test_missing_field_is_unavailable() {
        let archive = MemoryArchive::new();
        let cycle = ForecastCycle::parse("20250101", "00").unwrap();
        archive.insert(cycle, snapshot());
        let dataset = archive.open(&cycle).unwrap();
        assert!(matches!(
            dataset.read_field(ArchiveField::UWind10m, 0),
            Err(ForecastError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_with_field_checks_length() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let snap = DatasetSnapshot::new(TimeAxis::hourly(start, 2, 1), vec![0.0], vec![0.0]);
        assert!(snap.with_field(ArchiveField::PrecipitationRate, vec![0.0; 3]).is_err());
    }
}
