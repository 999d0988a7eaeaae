//! Metrics hooks for scalable filter operations
//!
//! Counters for adds, lookups, growth and store failures, plus cumulative
//! latencies. Hosts that export to an external system implement
//! [`MetricsRecorder`] and pass it to `ScalableFilter::with_metrics`.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use scalable_bloom::{Metrics, ScalableFilter};
//!
//! let metrics = Arc::new(Metrics::new());
//! let filter = ScalableFilter::initialize(store, "visits", config)
//!     .await?
//!     .with_metrics(metrics.clone());
//!
//! filter.add(b"alice").await?;
//! assert_eq!(metrics.snapshot().items_added, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector for scalable filter operations
///
/// Thread-safe counters shared by every handle it is attached to.
#[derive(Default)]
pub struct Metrics {
    /// Items written (single and bulk adds)
    pub items_added: AtomicU64,
    /// Add calls completed (a bulk add counts once)
    pub add_calls: AtomicU64,
    /// Total lookups performed
    pub lookups_performed: AtomicU64,
    /// Total positive lookups (possibly false positives)
    pub lookups_positive: AtomicU64,
    /// Levels this process appended to a filter
    pub levels_created: AtomicU64,
    /// Growth attempts that found another handle had already grown the filter
    pub growth_races_lost: AtomicU64,
    /// Operations that failed because the store was unavailable
    pub store_failures: AtomicU64,
    /// Cumulative add time in nanoseconds
    pub add_time_ns: AtomicU64,
    /// Cumulative lookup time in nanoseconds
    pub lookup_time_ns: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed add of `items` items
    pub fn record_add(&self, items: u64, duration: Duration) {
        self.add_calls.fetch_add(1, Ordering::Relaxed);
        self.items_added.fetch_add(items, Ordering::Relaxed);
        self.add_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a completed lookup
    pub fn record_lookup(&self, duration: Duration, found: bool) {
        self.lookups_performed.fetch_add(1, Ordering::Relaxed);
        self.lookup_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if found {
            self.lookups_positive.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a level appended by this process
    pub fn record_level_created(&self, _index: u32) {
        self.levels_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lost growth race
    pub fn record_growth_race_lost(&self) {
        self.growth_races_lost.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an operation that failed on the store
    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_added: self.items_added.load(Ordering::Relaxed),
            add_calls: self.add_calls.load(Ordering::Relaxed),
            lookups_performed: self.lookups_performed.load(Ordering::Relaxed),
            lookups_positive: self.lookups_positive.load(Ordering::Relaxed),
            levels_created: self.levels_created.load(Ordering::Relaxed),
            growth_races_lost: self.growth_races_lost.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            avg_add_ns: self.avg_add_time_ns(),
            avg_lookup_ns: self.avg_lookup_time_ns(),
        }
    }

    /// Average time per add call in nanoseconds
    pub fn avg_add_time_ns(&self) -> u64 {
        let total = self.add_time_ns.load(Ordering::Relaxed);
        let count = self.add_calls.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Average lookup time in nanoseconds
    pub fn avg_lookup_time_ns(&self) -> u64 {
        let total = self.lookup_time_ns.load(Ordering::Relaxed);
        let count = self.lookups_performed.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Ratio of positive lookups to total lookups
    ///
    /// Includes true positives, so this is an upper bound on the observed
    /// false positive rate.
    pub fn observed_positive_rate(&self) -> f64 {
        let total = self.lookups_performed.load(Ordering::Relaxed);
        let positive = self.lookups_positive.load(Ordering::Relaxed);
        if total > 0 {
            positive as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.items_added.store(0, Ordering::Relaxed);
        self.add_calls.store(0, Ordering::Relaxed);
        self.lookups_performed.store(0, Ordering::Relaxed);
        self.lookups_positive.store(0, Ordering::Relaxed);
        self.levels_created.store(0, Ordering::Relaxed);
        self.growth_races_lost.store(0, Ordering::Relaxed);
        self.store_failures.store(0, Ordering::Relaxed);
        self.add_time_ns.store(0, Ordering::Relaxed);
        self.lookup_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_added: u64,
    pub add_calls: u64,
    pub lookups_performed: u64,
    pub lookups_positive: u64,
    pub levels_created: u64,
    pub growth_races_lost: u64,
    pub store_failures: u64,
    pub avg_add_ns: u64,
    pub avg_lookup_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to integrate with external metrics systems
/// like Prometheus, StatsD, or OpenTelemetry.
pub trait MetricsRecorder: Send + Sync {
    /// Record a completed add of `items` items
    fn record_add(&self, items: u64, duration: Duration);

    /// Record a completed lookup
    fn record_lookup(&self, duration: Duration, found: bool);

    /// Record a level appended by this process
    fn record_level_created(&self, index: u32);

    /// Record a lost growth race
    fn record_growth_race_lost(&self);

    /// Record an operation that failed on the store
    fn record_store_failure(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_add(&self, _: u64, _: Duration) {}
    fn record_lookup(&self, _: Duration, _: bool) {}
    fn record_level_created(&self, _: u32) {}
    fn record_growth_race_lost(&self) {}
    fn record_store_failure(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_add(&self, items: u64, duration: Duration) {
        Metrics::record_add(self, items, duration);
    }

    fn record_lookup(&self, duration: Duration, found: bool) {
        Metrics::record_lookup(self, duration, found);
    }

    fn record_level_created(&self, index: u32) {
        Metrics::record_level_created(self, index);
    }

    fn record_growth_race_lost(&self) {
        Metrics::record_growth_race_lost(self);
    }

    fn record_store_failure(&self) {
        Metrics::record_store_failure(self);
    }
}
