//! Tiered Cache Module
//!
//! Façade over the tier-1 memory store and an optional tier-2 remote store.
//!
//! Reads try tier-1 first and fall through to tier-2; a tier-2 hit is copied
//! back into tier-1 with tier-1's default TTL (the remaining remote TTL is
//! not carried over). Writes go to tier-1 first and then to tier-2: a
//! tier-2 failure is logged and never undoes or fails the tier-1 write.
//!
//! Tier-1 is locked only for the synchronous part of each call, never
//! across a tier-2 await, so two concurrent misses on the same key may both
//! reach tier-2 and both repopulate tier-1. The writes are identical, so
//! this only costs a duplicate fetch.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, MemoryStore, RedisStore, RemoteStore, SharedMemoryStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::telemetry;

// == Tiered Stats ==
#[derive(Debug, Clone, Serialize)]
pub struct TieredStats {
    /// Tier-1 statistics
    pub local: CacheStats,
    /// Whether a tier-2 store is configured
    pub remote_enabled: bool,
    /// Whether the tier-2 store currently holds a connection
    pub remote_connected: bool,
}

// == Tiered Cache ==
/// Two-level cache. Cloning is cheap and clones share both tiers.
pub struct TieredCache<V> {
    local: SharedMemoryStore<V>,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl<V> Clone for TieredCache<V> {
    fn clone(&self) -> Self {
        Self {
            local: Arc::clone(&self.local),
            remote: self.remote.clone(),
        }
    }
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a memory-only cache.
    pub fn new(local: MemoryStore<V>) -> Self {
        Self {
            local: local.into_shared(),
            remote: None,
        }
    }

    /// Adds a tier-2 store.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Builds the cache described by `config`, connecting to Redis when
    /// remote settings are selected.
    ///
    /// # Errors
    /// Fails for contradictory settings (tiered mode without a remote
    /// endpoint) or an unparsable Redis URL. An unreachable Redis is not an
    /// error; the remote tier starts degraded.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let local = MemoryStore::new(config.max_memory_usage, config.default_ttl);
        let cache = Self::new(local);

        match config.effective_remote()? {
            Some(remote) => {
                let store = RedisStore::connect(remote.clone()).await?;
                info!(connected = store.is_connected(), "two-tier cache configured");
                Ok(cache.with_remote(Arc::new(store)))
            }
            None => {
                info!("memory-only cache configured");
                Ok(cache)
            }
        }
    }

    /// Tier-1 store, for the sweep task and direct inspection.
    pub fn local(&self) -> &SharedMemoryStore<V> {
        &self.local
    }

    pub fn remote(&self) -> Option<&Arc<dyn RemoteStore>> {
        self.remote.as_ref()
    }

    // == Get ==
    /// Looks `key` up in tier-1, then tier-2, warming tier-1 on a tier-2 hit.
    pub async fn get(&self, key: &str) -> Option<V> {
        if let Some(value) = self.local.write().await.get(key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => "local").increment(1);
            return Some(value);
        }

        let Some(remote) = &self.remote else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
            return None;
        };

        match remote.get_json::<V>(key).await {
            Some(value) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => "remote").increment(1);
                if let Err(e) = self.local.write().await.set(key, value.clone(), None) {
                    warn!(key, error = %e, "could not warm local tier from remote hit");
                } else {
                    debug!(key, "warmed local tier from remote hit");
                }
                Some(value)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    // == Set ==
    /// Writes `value` to tier-1 with `ttl` (default TTL when `None`) and to
    /// tier-2 with the same TTL at second granularity.
    ///
    /// Tier-2 is only written once tier-1 accepted the value, so both tiers
    /// agree on the last successful write.
    ///
    /// # Errors
    /// Tier-1 rejections (invalid key, value larger than the memory budget)
    /// are returned and tier-2 is left alone. A value too large for tier-1
    /// also invalidates `key` in both tiers, so the previous value is never
    /// served after a newer write was attempted.
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        let local_result = self.local.write().await.set(key, value.clone(), ttl);
        match local_result {
            Ok(()) => {}
            Err(e @ CacheError::CapacityExceeded { .. }) => {
                debug!(key, error = %e, "local tier rejected write, invalidating key");
                self.delete(key).await;
                return Err(e);
            }
            Err(e) => {
                debug!(key, error = %e, "local tier rejected write");
                return Err(e);
            }
        }

        if let Some(remote) = &self.remote {
            let remote_ttl = ttl.or(Some(self.local.read().await.default_ttl()));
            if !remote.set_json(key, &value, remote_ttl).await {
                debug!(key, "remote write skipped or failed");
            }
        }

        Ok(())
    }

    // == Get Or Fetch ==
    /// Returns the cached value or computes it with `fetch` and caches it.
    ///
    /// Errors from `fetch` are returned as-is and nothing is cached. A
    /// failure to cache the fetched value is logged only.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, ttl: Option<Duration>, fetch: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        if let Err(e) = self.set(key, value.clone(), ttl).await {
            warn!(key, error = %e, "fetched value could not be cached");
        }
        Ok(value)
    }

    // == Delete ==
    /// Removes `key` from both tiers; true if either held it.
    pub async fn delete(&self, key: &str) -> bool {
        let local = self.local.write().await.delete(key);
        let remote = match &self.remote {
            Some(remote) => remote.delete(key).await,
            None => false,
        };
        local || remote
    }

    // == Has ==
    pub async fn has(&self, key: &str) -> bool {
        if self.local.read().await.has(key) {
            return true;
        }
        match &self.remote {
            Some(remote) => remote.has(key).await,
            None => false,
        }
    }

    // == Clear ==
    pub async fn clear(&self) {
        self.local.write().await.clear();
        if let Some(remote) = &self.remote {
            if !remote.clear().await {
                warn!("remote tier could not be cleared");
            }
        }
    }

    // == Keys ==
    /// Union of the live keys of both tiers, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.local.read().await.keys().into_iter().collect();
        if let Some(remote) = &self.remote {
            keys.extend(remote.keys("*").await);
        }
        keys.into_iter().collect()
    }

    // == Stats ==
    pub async fn stats(&self) -> TieredStats {
        TieredStats {
            local: self.local.read().await.stats(),
            remote_enabled: self.remote.is_some(),
            remote_connected: self
                .remote
                .as_ref()
                .map(|remote| remote.is_connected())
                .unwrap_or(false),
        }
    }
}
