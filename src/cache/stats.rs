//! Cache Statistics Module
//!
//! Tracks tier-1 counters and memory utilization.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of tier-1 performance and memory usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of live entries
    pub count: usize,
    /// Sum of the estimated sizes of held entries, including expired ones
    /// not yet removed
    pub memory_usage: usize,
    /// Configured memory budget
    pub max_memory_usage: usize,
    /// `memory_usage` as a percentage of `max_memory_usage`
    pub utilization_percent: f64,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted to make room
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
        metrics::counter!(crate::telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
    }

    // == Record Expirations ==
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    // == Update Memory ==
    /// Refreshes the entry count and memory figures.
    pub fn set_usage(&mut self, count: usize, memory_usage: usize, max_memory_usage: usize) {
        self.count = count;
        self.memory_usage = memory_usage;
        self.max_memory_usage = max_memory_usage;
        self.utilization_percent = if max_memory_usage == 0 {
            0.0
        } else {
            memory_usage as f64 / max_memory_usage as f64 * 100.0
        };
    }
}
