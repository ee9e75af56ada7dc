//! Tests for the memoizing dataset selector.

use std::sync::Arc;

use forecast_archive::{DatasetSelector, ForecastArchive, MemoryArchive};
use forecast_common::{ArchiveField, ForecastCycle, ForecastError, ParameterId};
use test_utils::{gfs_cycle, gfs_like_snapshot, published_archive};

fn selector(archive: Arc<MemoryArchive>, capacity: usize) -> DatasetSelector {
    DatasetSelector::new(archive as Arc<dyn ForecastArchive>, capacity).unwrap()
}

// ============================================================================
// Memoization
// ============================================================================

#[tokio::test]
async fn test_repeated_selection_fetches_once() {
    let cycle = gfs_cycle();
    let archive = published_archive(&cycle, 8);
    let selector = selector(archive.clone(), 4);

    let first = selector.select(&cycle).await.unwrap();
    let second = selector.select(&cycle).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(archive.open_count(), 1);

    let stats = selector.stats().await;
    assert_eq!(stats.selections, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.fetches, 1);
    assert_eq!(stats.cached, 1);
}

#[tokio::test]
async fn test_concurrent_selection_fetches_once() {
    let cycle = gfs_cycle();
    let archive = published_archive(&cycle, 8);
    let selector = Arc::new(selector(archive.clone(), 4));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let selector = selector.clone();
            tokio::spawn(async move { selector.select(&cycle).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(archive.open_count(), 1);
}

#[tokio::test]
async fn test_distinct_cycles_fetch_separately() {
    let first = gfs_cycle();
    let second = ForecastCycle::parse("20250101", "06").unwrap();
    let archive = published_archive(&first, 4);
    archive.insert(second, gfs_like_snapshot(&second, 4));
    let selector = selector(archive.clone(), 4);

    let a = selector.select(&first).await.unwrap();
    let b = selector.select(&second).await.unwrap();
    assert_eq!(a.cycle(), first);
    assert_eq!(b.cycle(), second);
    assert_eq!(archive.open_count(), 2);
}

#[tokio::test]
async fn test_lru_eviction_refetches() {
    let cycles: Vec<ForecastCycle> = ["00", "06", "12"]
        .iter()
        .map(|h| ForecastCycle::parse("20250101", h).unwrap())
        .collect();
    let archive = Arc::new(MemoryArchive::new());
    for cycle in &cycles {
        archive.insert(*cycle, gfs_like_snapshot(cycle, 2));
    }
    let selector = selector(archive.clone(), 2);

    for cycle in &cycles {
        selector.select(cycle).await.unwrap();
    }
    // 00z was least recently used and has been evicted
    selector.select(&cycles[0]).await.unwrap();

    assert_eq!(archive.open_count(), 4);
    let stats = selector.stats().await;
    assert_eq!(stats.evictions, 2);
    assert_eq!(stats.cached, 2);
}

#[test]
fn test_zero_capacity_rejected() {
    let archive: Arc<dyn ForecastArchive> = Arc::new(MemoryArchive::new());
    assert!(matches!(
        DatasetSelector::new(archive, 0),
        Err(ForecastError::Configuration(_))
    ));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unavailable_cycle_is_not_cached() {
    let cycle = gfs_cycle();
    let archive = Arc::new(MemoryArchive::new());
    let selector = selector(archive.clone(), 4);

    let err = selector.select(&cycle).await.unwrap_err();
    assert!(matches!(err, ForecastError::DataUnavailable { .. }));
    assert_eq!(selector.len().await, 0);

    // Publishing the cycle later makes the next selection succeed
    archive.insert(cycle, gfs_like_snapshot(&cycle, 4));
    selector.select(&cycle).await.unwrap();

    assert_eq!(archive.open_count(), 2);
    let stats = selector.stats().await;
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.fetches, 2);
}

// ============================================================================
// Time axis validation
// ============================================================================

#[tokio::test]
async fn test_validate_within_time_axis() {
    let cycle = gfs_cycle();
    let selector = selector(published_archive(&cycle, 240), 4);
    let dataset = selector.select(&cycle).await.unwrap();

    for index in [0, 1, 120, 239] {
        assert!(dataset.validate(index).is_ok(), "index {}", index);
    }
}

#[tokio::test]
async fn test_forecast_hour_240_on_240_step_axis() {
    let cycle = gfs_cycle();
    let selector = selector(published_archive(&cycle, 240), 4);
    let dataset = selector.select(&cycle).await.unwrap();

    match dataset.validate(240) {
        Err(ForecastError::ForecastHourOutOfRange { index, len }) => {
            assert_eq!(index, 240);
            assert_eq!(len, 240);
        }
        other => panic!("expected ForecastHourOutOfRange, got {:?}", other),
    }
    assert!(dataset.read_field(ArchiveField::Temperature2m, 240).is_err());
}

#[tokio::test]
async fn test_read_parameter_returns_components_in_order() {
    let cycle = gfs_cycle();
    let selector = selector(published_archive(&cycle, 4), 4);
    let dataset = selector.select(&cycle).await.unwrap();

    let spec = ParameterId::SurfaceWind.spec();
    let fields = dataset.read_parameter(&spec, 1).unwrap();
    assert_eq!(fields.len(), 2);
    let u = dataset.read_field(ArchiveField::UWind10m, 1).unwrap();
    let v = dataset.read_field(ArchiveField::VWind10m, 1).unwrap();
    assert_eq!(fields[0], u);
    assert_eq!(fields[1], v);
}
