//! Cache Metrics Module
//!
//! Telemetry sink seam and the counter-backed sink used by the server.
//! Emission is fire-and-forget: it never blocks on I/O and never fails.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::trace;

// == Metric ==
/// Metric names the cache core reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// A lookup hit a decode or store failure
    GetCacheValueFailure,
    /// A merge completed against an open store
    UpdateCacheSuccess,
    /// A merge caught a decode or store failure
    UpdateCacheFailure,
}

impl Metric {
    /// Name reported to the telemetry backend.
    pub fn name(self) -> &'static str {
        match self {
            Metric::GetCacheValueFailure => "lookup/get_cache_value/failure",
            Metric::UpdateCacheSuccess => "lookup/update_cache/success",
            Metric::UpdateCacheFailure => "lookup/update_cache/failure",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Metrics Sink ==
/// Receiver of metric emissions.
pub trait MetricsSink: Send + Sync {
    fn emit(&self, metric: Metric, count: u64);
}

// == Cache Metrics ==
/// Counts every emission in atomic counters.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    get_cache_value_failure: AtomicU64,
    update_cache_success: AtomicU64,
    update_cache_failure: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Lookups that failed to decode or read the store
    pub get_cache_value_failure: u64,
    /// Merges that completed
    pub update_cache_success: u64,
    /// Merges that caught a failure
    pub update_cache_failure: u64,
}

impl MetricsSnapshot {
    // == Merge Failure Rate ==
    /// Returns failures / (successes + failures), or 0.0 if no merges ran.
    pub fn merge_failure_rate(&self) -> f64 {
        let total = self.update_cache_success + self.update_cache_failure;
        if total == 0 {
            0.0
        } else {
            self.update_cache_failure as f64 / total as f64
        }
    }
}

impl CacheMetrics {
    // == Constructor ==
    /// Creates a new CacheMetrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, metric: Metric) -> &AtomicU64 {
        match metric {
            Metric::GetCacheValueFailure => &self.get_cache_value_failure,
            Metric::UpdateCacheSuccess => &self.update_cache_success,
            Metric::UpdateCacheFailure => &self.update_cache_failure,
        }
    }

    /// Current value of one counter.
    pub fn count(&self, metric: Metric) -> u64 {
        self.counter(metric).load(Ordering::Relaxed)
    }

    // == Snapshot ==
    /// Copies all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            get_cache_value_failure: self.count(Metric::GetCacheValueFailure),
            update_cache_success: self.count(Metric::UpdateCacheSuccess),
            update_cache_failure: self.count(Metric::UpdateCacheFailure),
        }
    }
}

impl MetricsSink for CacheMetrics {
    fn emit(&self, metric: Metric, count: u64) {
        self.counter(metric).fetch_add(count, Ordering::Relaxed);
        trace!(metric = metric.name(), count, "metric emitted");
    }
}
