//! Cache Store Module
//!
//! Tier-1 cache engine: a HashMap with per-entry TTL, a global memory
//! budget and hit-count eviction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::entry::estimate_size;
use crate::cache::eviction::select_victims;
use crate::cache::{CacheEntry, CacheStats, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// Bounded in-memory storage with TTL and memory-budget eviction.
///
/// Not synchronized on its own; share it as [`SharedMemoryStore`].
#[derive(Debug)]
pub struct MemoryStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Exact sum of `size_bytes` over `entries`
    memory_usage: usize,
    max_memory_usage: usize,
    default_ttl: Duration,
    next_sequence: u64,
    clock: Arc<dyn Clock>,
}

/// Tier-1 store shared between the façade, handlers and the sweep task.
pub type SharedMemoryStore<V> = Arc<tokio::sync::RwLock<MemoryStore<V>>>;

impl<V> MemoryStore<V>
where
    V: Clone + Serialize,
{
    // == Constructor ==
    /// Creates a new store with the given memory budget and default TTL.
    ///
    /// # Arguments
    /// * `max_memory_usage` - Budget in bytes for all entries together
    /// * `default_ttl` - TTL for entries stored without an explicit one
    pub fn new(max_memory_usage: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_memory_usage, default_ttl, Arc::new(SystemClock))
    }

    /// Creates a new store reading time from `clock`.
    pub fn with_clock(max_memory_usage: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            memory_usage: 0,
            max_memory_usage,
            default_ttl,
            next_sequence: 0,
            clock,
        }
    }

    /// Wraps the store for shared use.
    pub fn into_shared(self) -> SharedMemoryStore<V> {
        Arc::new(tokio::sync::RwLock::new(self))
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// An existing entry under `key` is removed first, so its size is never
    /// counted twice and its TTL restarts. When the new entry does not fit,
    /// expired entries are purged and then live entries are evicted in
    /// eviction order until it does.
    ///
    /// # Errors
    /// - `InvalidRequest` for an empty or oversized key
    /// - `CapacityExceeded` when the entry alone is larger than the whole
    ///   budget; nothing is evicted in that case
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let size_bytes = estimate_size(&key, &value);
        if size_bytes > self.max_memory_usage {
            return Err(CacheError::CapacityExceeded {
                size: size_bytes,
                max: self.max_memory_usage,
            });
        }

        // Overwrite case: drop the old entry before accounting for the new one
        self.remove_entry(&key);

        if self.memory_usage + size_bytes > self.max_memory_usage {
            self.cleanup_expired();
        }
        if self.memory_usage + size_bytes > self.max_memory_usage {
            let needed = self.memory_usage + size_bytes - self.max_memory_usage;
            for victim in select_victims(&self.entries, needed) {
                if self.remove_entry(&victim) {
                    self.stats.record_eviction();
                    debug!(key = %victim, "evicted entry to free memory");
                }
            }
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl, size_bytes, sequence);
        self.memory_usage += size_bytes;
        self.entries.insert(key, entry);

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired, counting a hit on the
    /// entry. Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let expired = match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.record_hit();
                let value = entry.value.clone();
                self.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
        }
        self.stats.record_miss();
        None
    }

    // == Has ==
    /// Checks for a live entry without counting a hit.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    // == Delete ==
    /// Removes an entry by key, returning whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Removes every entry and resets memory usage to zero.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.memory_usage = 0;
    }

    // == Keys ==
    /// Returns the keys of all live entries.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == TTL Remaining ==
    /// Returns the remaining TTL of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.remove_entry(&key);
        }

        self.stats.record_expirations(count);
        count
    }

    // == Stats ==
    /// Returns current store statistics.
    ///
    /// `count` covers live entries only; `memory_usage` still includes
    /// expired entries until they are swept or read.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let live = self
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count();

        let mut stats = self.stats.clone();
        stats.set_usage(live, self.memory_usage, self.max_memory_usage);
        stats
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub fn max_memory_usage(&self) -> usize {
        self.max_memory_usage
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Hit count of a stored entry, expired or not.
    pub fn hit_count(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.hit_count)
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.memory_usage -= entry.size_bytes;
                true
            }
            None => false,
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
