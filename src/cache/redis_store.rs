//! Redis Store Module
//!
//! Tier-2 adapter over a multiplexed Redis connection.
//!
//! The store connects eagerly, but a failed connect is not fatal: it stays
//! disconnected and every operation degrades to a miss until a later
//! operation manages to reconnect. Reconnect attempts are spaced out by
//! [`RECONNECT_BACKOFF`] so an outage does not add a connect timeout to
//! every request.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, RedisResult};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::remote::{ttl_to_secs, RemoteStore};
use crate::config::RemoteConfig;
use crate::error::{CacheError, Result};
use crate::telemetry;

/// Minimum spacing between reconnect attempts.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

// == Redis Store ==
pub struct RedisStore {
    client: Client,
    config: RemoteConfig,
    connection: RwLock<Option<MultiplexedConnection>>,
    connected: AtomicBool,
    last_attempt: Mutex<Option<Instant>>,
}

impl RedisStore {
    // == Constructor ==
    /// Creates the store and attempts a first connection.
    ///
    /// # Errors
    /// Only an unparsable connection URL fails; an unreachable server
    /// leaves the store in degraded mode.
    pub async fn connect(config: RemoteConfig) -> Result<Self> {
        let url = config.connection_url();
        let client = Client::open(url.as_str())
            .map_err(|e| CacheError::Config(format!("invalid Redis URL: {}", e)))?;

        let store = Self {
            client,
            config,
            connection: RwLock::new(None),
            connected: AtomicBool::new(false),
            last_attempt: Mutex::new(None),
        };
        store.reconnect().await;
        Ok(store)
    }

    /// Prefix applied to every key this store touches.
    pub fn key_prefix(&self) -> &str {
        &self.config.key_prefix
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    fn unprefixed(&self, key: String) -> String {
        match key.strip_prefix(self.config.key_prefix.as_str()) {
            Some(stripped) => stripped.to_string(),
            None => key,
        }
    }

    // == Connection Management ==
    async fn connection(&self) -> Option<MultiplexedConnection> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Some(conn.clone());
        }
        self.reconnect().await
    }

    async fn reconnect(&self) -> Option<MultiplexedConnection> {
        {
            let mut last_attempt = self
                .last_attempt
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(at) = *last_attempt {
                if at.elapsed() < RECONNECT_BACKOFF {
                    return None;
                }
            }
            *last_attempt = Some(Instant::now());
        }

        let attempt = tokio::time::timeout(
            self.config.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await;

        match attempt {
            Ok(Ok(conn)) => {
                *self.connection.write().await = Some(conn.clone());
                self.connected.store(true, Ordering::SeqCst);
                info!(prefix = %self.config.key_prefix, "connected to Redis");
                Some(conn)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Redis connection failed, remote tier degraded to misses");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.connect_timeout.as_millis() as u64,
                    "Redis connection timed out, remote tier degraded to misses"
                );
                None
            }
        }
    }

    async fn mark_disconnected(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            warn!("lost Redis connection");
        }
        *self.connection.write().await = None;
    }

    // == Command Runner ==
    /// Runs one command with the operation timeout, mapping every failure
    /// to `None`.
    async fn run<T, F, Fut>(&self, operation: &'static str, command: F) -> Option<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let Some(conn) = self.connection().await else {
            debug!(operation, "Redis unavailable, skipping command");
            metrics::counter!(telemetry::REMOTE_ERRORS_TOTAL, "operation" => operation).increment(1);
            return None;
        };

        match tokio::time::timeout(self.config.operation_timeout, command(conn)).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Redis command failed");
                metrics::counter!(telemetry::REMOTE_ERRORS_TOTAL, "operation" => operation).increment(1);
                if is_connection_error(&e) {
                    self.mark_disconnected().await;
                }
                None
            }
            Err(_) => {
                warn!(operation, "Redis command timed out");
                metrics::counter!(telemetry::REMOTE_ERRORS_TOTAL, "operation" => operation).increment(1);
                None
            }
        }
    }
}

fn is_connection_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
}

#[async_trait]
impl RemoteStore for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> Option<String> {
        let key = self.prefixed(key);
        self.run("GET", move |mut conn| async move {
            let value: Option<String> = conn.get(&key).await?;
            Ok::<_, RedisError>(value)
        })
        .await
        .flatten()
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        let key = self.prefixed(key);
        let value = value.to_string();
        self.run("SET", move |mut conn| async move {
            let _: () = match ttl {
                Some(ttl) => conn.set_ex(&key, value, ttl_to_secs(ttl)).await?,
                None => conn.set(&key, value).await?,
            };
            Ok::<_, RedisError>(())
        })
        .await
        .is_some()
    }

    async fn delete(&self, key: &str) -> bool {
        let key = self.prefixed(key);
        self.run("DEL", move |mut conn| async move {
            let removed: i64 = conn.del(&key).await?;
            Ok::<_, RedisError>(removed > 0)
        })
        .await
        .unwrap_or(false)
    }

    async fn clear(&self) -> bool {
        let pattern = self.prefixed("*");
        self.run("CLEAR", move |mut conn| async move {
            let keys: Vec<String> = conn.keys(&pattern).await?;
            if !keys.is_empty() {
                let _: i64 = conn.del(&keys).await?;
            }
            Ok::<_, RedisError>(())
        })
        .await
        .is_some()
    }

    async fn has(&self, key: &str) -> bool {
        let key = self.prefixed(key);
        self.run("EXISTS", move |mut conn| async move {
            let exists: bool = conn.exists(&key).await?;
            Ok::<_, RedisError>(exists)
        })
        .await
        .unwrap_or(false)
    }

    async fn keys(&self, pattern: &str) -> Vec<String> {
        let pattern = self.prefixed(pattern);
        let keys = self
            .run("KEYS", move |mut conn| async move {
                let keys: Vec<String> = conn.keys(&pattern).await?;
                Ok::<_, RedisError>(keys)
            })
            .await
            .unwrap_or_default();
        keys.into_iter().map(|key| self.unprefixed(key)).collect()
    }

    async fn multi_get(&self, keys: &[String]) -> Vec<Option<String>> {
        if keys.is_empty() {
            return Vec::new();
        }
        let prefixed: Vec<String> = keys.iter().map(|key| self.prefixed(key)).collect();
        let expected = prefixed.len();
        let values = self
            .run("MGET", move |mut conn| async move {
                let values: Vec<Option<String>> = conn.mget(&prefixed).await?;
                Ok::<_, RedisError>(values)
            })
            .await;

        match values {
            Some(values) if values.len() == expected => values,
            _ => vec![None; expected],
        }
    }

    async fn multi_set(&self, entries: &[(String, String)], ttl: Option<Duration>) -> bool {
        if entries.is_empty() {
            return true;
        }
        let entries: Vec<(String, String)> = entries
            .iter()
            .map(|(key, value)| (self.prefixed(key), value.clone()))
            .collect();
        self.run("MSET", move |mut conn| async move {
            let mut pipe = redis::pipe();
            pipe.atomic();
            match ttl {
                Some(ttl) => {
                    let secs = ttl_to_secs(ttl);
                    for (key, value) in &entries {
                        pipe.set_ex(key, value, secs).ignore();
                    }
                }
                None => {
                    pipe.mset(&entries[..]).ignore();
                }
            }
            let _: () = pipe.query_async(&mut conn).await?;
            Ok::<_, RedisError>(())
        })
        .await
        .is_some()
    }

    async fn increment(&self, key: &str, amount: i64) -> Option<i64> {
        let key = self.prefixed(key);
        self.run("INCR", move |mut conn| async move {
            let value: i64 = conn.incr(&key, amount).await?;
            Ok::<_, RedisError>(value)
        })
        .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> bool {
        let key = self.prefixed(key);
        let secs = ttl_to_secs(ttl) as i64;
        self.run("EXPIRE", move |mut conn| async move {
            let applied: bool = conn.expire(&key, secs).await?;
            Ok::<_, RedisError>(applied)
        })
        .await
        .unwrap_or(false)
    }

    async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let key = self.prefixed(key);
        let secs = self
            .run("TTL", move |mut conn| async move {
                let secs: i64 = conn.ttl(&key).await?;
                Ok::<_, RedisError>(secs)
            })
            .await?;
        // -2: missing key, -1: no expiry
        (secs >= 0).then(|| Duration::from_secs(secs as u64))
    }
}
