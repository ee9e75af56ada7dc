//! Memoizing dataset selector.
//!
//! Opened datasets are kept in an LRU keyed by forecast cycle. Concurrent
//! selections of the same cycle share one archive fetch; a failed fetch is
//! not cached, so the next selection retries it.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use forecast_common::{ForecastCycle, ForecastError, ForecastResult};

use crate::archive::ForecastArchive;
use crate::dataset::GriddedDataset;

/// Default number of cycles kept open.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

type Slot = Arc<OnceCell<Arc<GriddedDataset>>>;

/// Selector statistics.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SelectorStats {
    /// Total `select` calls
    pub selections: u64,
    /// Selections served from an already-open dataset
    pub hits: u64,
    /// Archive fetches started
    pub fetches: u64,
    /// Archive fetches that failed
    pub failures: u64,
    /// Cycles dropped to make room
    pub evictions: u64,
    /// Cycles currently held
    pub cached: usize,
    pub capacity: usize,
}

impl SelectorStats {
    pub fn hit_rate(&self) -> f64 {
        if self.selections == 0 {
            0.0
        } else {
            (self.hits as f64 / self.selections as f64) * 100.0
        }
    }
}

/// Obtains dataset handles per forecast cycle, fetching each at most once
/// while it stays cached.
pub struct DatasetSelector {
    archive: Arc<dyn ForecastArchive>,
    cache: Mutex<LruCache<ForecastCycle, Slot>>,
    stats: Mutex<SelectorStats>,
    capacity: usize,
}

impl DatasetSelector {
    /// Create a selector holding at most `capacity` cycles.
    pub fn new(archive: Arc<dyn ForecastArchive>, capacity: usize) -> ForecastResult<Self> {
        let cache_size = NonZeroUsize::new(capacity).ok_or_else(|| {
            ForecastError::Configuration("dataset cache capacity must be > 0".to_string())
        })?;

        Ok(Self {
            archive,
            cache: Mutex::new(LruCache::new(cache_size)),
            stats: Mutex::new(SelectorStats {
                capacity,
                ..Default::default()
            }),
            capacity,
        })
    }

    pub fn archive(&self) -> &Arc<dyn ForecastArchive> {
        &self.archive
    }

    /// Dataset for `cycle`, opening it on first use.
    ///
    /// Fails with `DataUnavailable` if the archive cannot provide the cycle.
    pub async fn select(&self, cycle: &ForecastCycle) -> ForecastResult<Arc<GriddedDataset>> {
        let slot = self.slot(cycle).await;

        if let Some(dataset) = slot.get() {
            self.record(|s| {
                s.selections += 1;
                s.hits += 1;
            })
            .await;
            debug!(cycle = %cycle, "Dataset cache hit");
            return Ok(dataset.clone());
        }

        let mut fetched = false;
        let result = slot
            .get_or_try_init(|| {
                fetched = true;
                self.fetch(*cycle)
            })
            .await
            .cloned();

        self.record(|s| {
            s.selections += 1;
            if !fetched {
                s.hits += 1;
            }
        })
        .await;

        if result.is_err() {
            self.forget(cycle, &slot).await;
        }
        result
    }

    async fn slot(&self, cycle: &ForecastCycle) -> Slot {
        let mut cache = self.cache.lock().await;
        if let Some(slot) = cache.get(cycle) {
            return slot.clone();
        }

        let slot: Slot = Arc::new(OnceCell::new());
        if let Some((evicted, _)) = cache.push(*cycle, slot.clone()) {
            if evicted != *cycle {
                debug!(cycle = %evicted, "Evicted dataset");
                drop(cache);
                self.record(|s| s.evictions += 1).await;
            }
        }
        slot
    }

    async fn fetch(&self, cycle: ForecastCycle) -> ForecastResult<Arc<GriddedDataset>> {
        self.record(|s| s.fetches += 1).await;
        info!(cycle = %cycle, archive = self.archive.name(), "Fetching dataset");

        let archive = self.archive.clone();
        let opened = tokio::task::spawn_blocking(move || archive.open(&cycle))
            .await
            .map_err(|e| ForecastError::InternalError(format!("archive task failed: {}", e)))
            .and_then(|r| r);

        match opened {
            Ok(dataset) => {
                info!(
                    cycle = %cycle,
                    time_steps = dataset.time_axis().len(),
                    "Dataset ready"
                );
                Ok(Arc::new(dataset))
            }
            Err(e) => {
                warn!(cycle = %cycle, error = %e, "Dataset fetch failed");
                self.record(|s| s.failures += 1).await;
                Err(e)
            }
        }
    }

    /// Drop a failed slot unless another selection already replaced it.
    async fn forget(&self, cycle: &ForecastCycle, slot: &Slot) {
        let mut cache = self.cache.lock().await;
        let same = cache
            .peek(cycle)
            .map_or(false, |current| Arc::ptr_eq(current, slot));
        if same && !slot.initialized() {
            cache.pop(cycle);
        }
    }

    async fn record(&self, update: impl FnOnce(&mut SelectorStats)) {
        let mut stats = self.stats.lock().await;
        update(&mut stats);
    }

    /// Current statistics.
    pub async fn stats(&self) -> SelectorStats {
        let cached = self.cache.lock().await.len();
        let mut stats = self.stats.lock().await.clone();
        stats.cached = cached;
        stats
    }

    /// Number of cycles currently held (including in-flight fetches).
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    /// Drop every cached dataset.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
