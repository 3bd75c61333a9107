//! Remote Store Module
//!
//! Contract for the shared tier-2 store. Payloads cross the boundary as
//! JSON text and every operation is best-effort: implementations log
//! failures and answer with a miss, `false` or `None` instead of an error,
//! so an outage only ever looks like a cold cache to callers.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

// == Remote Store Trait ==
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether the store currently holds a usable connection.
    fn is_connected(&self) -> bool;

    async fn get(&self, key: &str) -> Option<String>;

    /// Stores `value`, expiring after `ttl` when given. Returns whether the
    /// write was acknowledged.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool;

    async fn delete(&self, key: &str) -> bool;

    /// Removes every key in this store's namespace.
    async fn clear(&self) -> bool;

    async fn has(&self, key: &str) -> bool;

    /// Keys in this store's namespace matching a glob `pattern`.
    async fn keys(&self, pattern: &str) -> Vec<String>;

    /// Fetches several keys at once; the result lines up with `keys`.
    async fn multi_get(&self, keys: &[String]) -> Vec<Option<String>>;

    async fn multi_set(&self, entries: &[(String, String)], ttl: Option<Duration>) -> bool;

    /// Adds `amount` to an integer counter, creating it at zero.
    async fn increment(&self, key: &str, amount: i64) -> Option<i64>;

    async fn expire(&self, key: &str, ttl: Duration) -> bool;

    /// Remaining TTL, or `None` for a missing key, a key without expiry,
    /// or an unreachable store.
    async fn ttl_remaining(&self, key: &str) -> Option<Duration>;
}

// == Typed Helpers ==
impl dyn RemoteStore {
    /// Reads and decodes a JSON value; undecodable payloads count as misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        decode(self.name(), key, &raw)
    }

    /// Encodes and stores a value; unencodable values are skipped.
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl).await,
            Err(e) => {
                warn!(store = self.name(), key, error = %e, "value is not JSON-representable, skipping remote write");
                false
            }
        }
    }

    /// Reads several JSON values at once, preserving input order.
    pub async fn multi_get_json<T: DeserializeOwned>(&self, keys: &[String]) -> Vec<Option<T>> {
        let raws = self.multi_get(keys).await;
        keys.iter()
            .zip(raws)
            .map(|(key, raw)| raw.and_then(|raw| decode(self.name(), key, &raw)))
            .collect()
    }
}

fn decode<T: DeserializeOwned>(store: &str, key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(store, key, error = %e, "failed to decode remote value, treating as miss");
            None
        }
    }
}

/// Converts a TTL to whole seconds for stores with second granularity,
/// rounding up and never below one second.
pub fn ttl_to_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}
