//! Render and dataset metrics.
//!
//! Values go to the `metrics` facade (exported at `/metrics` by the
//! Prometheus recorder) and to a few local counters served at `/api/metrics`.

use forecast_archive::SelectorStats;
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Outcome label for successful renders.
pub const OUTCOME_OK: &str = "ok";

/// Metrics collector for the forecast API.
#[derive(Debug)]
pub struct MetricsCollector {
    pub renders_total: AtomicU64,
    pub render_errors: AtomicU64,
    /// Total render time in microseconds
    render_time_us: AtomicU64,
    start_time: Instant,
}

/// Point-in-time view of the local counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub renders_total: u64,
    pub render_errors: u64,
    pub avg_render_ms: f64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            renders_total: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            render_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one `/render` request.
    ///
    /// `outcome` is [`OUTCOME_OK`] or the error code of the failure.
    pub fn record_render(&self, parameter: &'static str, outcome: &'static str, duration: Duration) {
        self.renders_total.fetch_add(1, Ordering::Relaxed);
        if outcome != OUTCOME_OK {
            self.render_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.render_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        counter!(
            "forecast_render_requests_total",
            "parameter" => parameter,
            "outcome" => outcome
        )
        .increment(1);
        histogram!("forecast_render_duration_seconds").record(duration.as_secs_f64());
    }

    /// Publish the dataset selector's running totals.
    pub fn record_selector_stats(&self, stats: &SelectorStats) {
        counter!("forecast_dataset_fetch_total", "outcome" => "ok")
            .absolute(stats.fetches.saturating_sub(stats.failures));
        counter!("forecast_dataset_fetch_total", "outcome" => "error").absolute(stats.failures);
        counter!("forecast_dataset_cache_hits_total").absolute(stats.hits);
        gauge!("forecast_dataset_cache_entries").set(stats.cached as f64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let renders_total = self.renders_total.load(Ordering::Relaxed);
        let total_us = self.render_time_us.load(Ordering::Relaxed);
        let avg_render_ms = if renders_total == 0 {
            0.0
        } else {
            (total_us as f64 / renders_total as f64) / 1000.0
        };

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            renders_total,
            render_errors: self.render_errors.load(Ordering::Relaxed),
            avg_render_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts_errors() {
        let metrics = MetricsCollector::new();
        metrics.record_render("surface_wind", OUTCOME_OK, Duration::from_millis(4));
        metrics.record_render("unknown", "UnknownParameter", Duration::from_millis(2));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.renders_total, 2);
        assert_eq!(snapshot.render_errors, 1);
        assert!((snapshot.avg_render_ms - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.renders_total, 0);
        assert_eq!(snapshot.avg_render_ms, 0.0);
    }
}
