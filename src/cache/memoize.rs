//! Memoize Module
//!
//! Wraps an async function so its results are cached in a [`TieredCache`]
//! under a key derived from its arguments.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::cache::TieredCache;

// == Memoized ==
/// An async function whose successful results are cached.
///
/// The cache key is `"{prefix}:{arguments as JSON}"`. Arguments that cannot
/// be encoded bypass the cache and call the function directly.
///
/// # Example
/// ```ignore
/// let search = Memoized::new(cache.clone(), "jobs.search", |query: String| async move {
///     backend.search(&query).await
/// })
/// .with_ttl(Duration::from_secs(30));
///
/// let hits = search.call("rust engineer".to_string()).await?;
/// ```
pub struct Memoized<V, F> {
    cache: TieredCache<V>,
    prefix: String,
    ttl: Option<Duration>,
    func: F,
}

impl<V, F> Memoized<V, F>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(cache: TieredCache<V>, prefix: impl Into<String>, func: F) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl: None,
            func,
        }
    }

    /// TTL for cached results; the cache default applies otherwise.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Cache key for a given argument value.
    pub fn key_for<A: Serialize>(&self, args: &A) -> Option<String> {
        match serde_json::to_string(args) {
            Ok(encoded) => Some(format!("{}:{}", self.prefix, encoded)),
            Err(e) => {
                warn!(prefix = %self.prefix, error = %e, "arguments not encodable, bypassing cache");
                None
            }
        }
    }

    // == Call ==
    /// Returns the cached result for `args` or runs the function and caches
    /// a successful result. Errors are never cached.
    pub async fn call<A, Fut, E>(&self, args: A) -> Result<V, E>
    where
        A: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let Some(key) = self.key_for(&args) else {
            return (self.func)(args).await;
        };

        self.cache
            .get_or_fetch(&key, self.ttl, || (self.func)(args))
            .await
    }

    /// Drops the cached result for `args`.
    pub async fn invalidate<A: Serialize>(&self, args: &A) -> bool {
        match self.key_for(args) {
            Some(key) => self.cache.delete(&key).await,
            None => false,
        }
    }
}
