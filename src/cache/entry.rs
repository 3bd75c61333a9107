//! Cache Entry Module
//!
//! Defines the structure for individual tier-1 entries with TTL and
//! eviction bookkeeping.

use std::time::Duration;

use serde::Serialize;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds), never mutated
    pub created_at: u64,
    /// Expiration window starting at `created_at`
    pub ttl: Duration,
    /// Successful reads since insertion
    pub hit_count: u64,
    /// Estimated serialized size counted against the memory budget
    pub size_bytes: usize,
    /// Store-wide insertion counter, breaks `created_at` ties
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now_ms` - Insertion time in Unix milliseconds
    /// * `ttl` - Expiration window
    /// * `size_bytes` - Estimated size of the entry
    /// * `sequence` - Insertion order within the owning store
    pub fn new(value: V, now_ms: u64, ttl: Duration, size_bytes: usize, sequence: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            ttl,
            hit_count: 0,
            size_bytes,
            sequence,
        }
    }

    // == Expires At ==
    /// Unix millisecond timestamp after which the entry is logically absent.
    pub fn expires_at(&self) -> u64 {
        self.created_at
            .saturating_add(self.ttl.as_millis().min(u64::MAX as u128) as u64)
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// The entry is still live at exactly `created_at + ttl` and expired
    /// strictly after it.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at()
    }

    // == Time To Live ==
    /// Returns remaining TTL, zero once expired.
    pub fn ttl_remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at().saturating_sub(now_ms))
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }

    // == Eviction Priority ==
    /// Sort key for eviction: fewest hits first, then oldest, then first inserted.
    pub fn eviction_priority(&self) -> (u64, u64, u64) {
        (self.hit_count, self.created_at, self.sequence)
    }
}

// == Size Estimation ==
/// Estimates the footprint of an entry from its key and JSON encoding.
///
/// Values that cannot be serialized fall back to their in-memory size.
pub fn estimate_size<V: Serialize>(key: &str, value: &V) -> usize {
    let value_size = serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .unwrap_or_else(|_| std::mem::size_of::<V>());
    key.len() + value_size
}
