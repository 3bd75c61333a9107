//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default TTL for tier-1 entries (5 minutes).
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Default tier-1 memory budget (100 MiB).
pub const DEFAULT_MAX_MEMORY_BYTES: usize = 100 * 1024 * 1024;

/// Shortest accepted sweep interval, in seconds.
pub const MIN_CLEANUP_INTERVAL_SECS: u64 = 1;

/// How the cache tiers are selected at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Two tiers when remote settings are present, memory only otherwise.
    #[default]
    Auto,
    /// Tier-1 only, even if remote settings are present.
    Memory,
    /// Both tiers; remote settings are mandatory.
    Tiered,
}

impl FromStr for CacheMode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "memory" => Ok(Self::Memory),
            "tiered" => Ok(Self::Tiered),
            other => Err(CacheError::Config(format!("unknown CACHE_MODE '{}'", other))),
        }
    }
}

/// Connection settings for the shared remote tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Full connection URL; takes precedence over the discrete fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    /// Namespace prepended to every remote key
    pub key_prefix: String,
    pub connect_timeout: Duration,
    /// Upper bound for a single remote command
    pub operation_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
            key_prefix: "cache:".to_string(),
            connect_timeout: Duration::from_millis(2000),
            operation_timeout: Duration::from_millis(1000),
        }
    }
}

impl RemoteConfig {
    /// Creates settings pointing at `host:port` with defaults elsewhere.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Creates settings from a full `redis://` URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Builds the connection URL handed to the Redis client.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }

    /// Loads remote settings, returning `None` when neither `REDIS_URL`
    /// nor `REDIS_HOST` is set.
    pub fn from_env() -> Option<Self> {
        let url = non_empty_var("REDIS_URL");
        let host = non_empty_var("REDIS_HOST");
        if url.is_none() && host.is_none() {
            return None;
        }

        let defaults = Self::default();
        Some(Self {
            url,
            host: host.unwrap_or(defaults.host),
            port: parse_var("REDIS_PORT").unwrap_or(defaults.port),
            password: non_empty_var("REDIS_PASSWORD"),
            db: parse_var("REDIS_DB").unwrap_or(defaults.db),
            key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            connect_timeout: parse_var("REDIS_CONNECT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            operation_timeout: parse_var("REDIS_OPERATION_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.operation_timeout),
        })
    }
}

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL for tier-1 entries without explicit TTL
    pub default_ttl: Duration,
    /// Tier-1 memory budget in bytes
    pub max_memory_usage: usize,
    /// Remote tier settings; `None` disables tier-2
    pub remote: Option<RemoteConfig>,
    pub mode: CacheMode,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds (at least
    /// [`MIN_CLEANUP_INTERVAL_SECS`] when loaded from the environment)
    pub cleanup_interval: u64,
    /// Samples kept per metric name by the monitor
    pub metrics_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `MAX_MEMORY_BYTES` - Tier-1 memory budget (default: 100 MiB)
    /// - `CACHE_MODE` - `auto`, `memory` or `tiered` (default: auto)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `METRICS_CAPACITY` - Samples kept per metric (default: 1000)
    /// - `REDIS_URL` / `REDIS_HOST` and friends - see [`RemoteConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let mode = match env::var("CACHE_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => CacheMode::Auto,
        };

        Ok(Self {
            default_ttl: parse_var("DEFAULT_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_ttl),
            max_memory_usage: parse_var("MAX_MEMORY_BYTES").unwrap_or(defaults.max_memory_usage),
            remote: RemoteConfig::from_env(),
            mode,
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: sweep_interval(parse_var("CLEANUP_INTERVAL"), defaults.cleanup_interval),
            metrics_capacity: parse_var("METRICS_CAPACITY").unwrap_or(defaults.metrics_capacity),
        })
    }

    /// Returns the remote settings the cache should connect with, if any.
    ///
    /// Fails when `CACHE_MODE=tiered` is requested without remote settings,
    /// since that cannot be degraded to anything meaningful.
    pub fn effective_remote(&self) -> Result<Option<&RemoteConfig>> {
        match (self.mode, self.remote.as_ref()) {
            (CacheMode::Memory, _) => Ok(None),
            (CacheMode::Auto, remote) => Ok(remote),
            (CacheMode::Tiered, Some(remote)) => Ok(Some(remote)),
            (CacheMode::Tiered, None) => Err(CacheError::Config(
                "CACHE_MODE=tiered requires REDIS_URL or REDIS_HOST".to_string(),
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            max_memory_usage: DEFAULT_MAX_MEMORY_BYTES,
            remote: None,
            mode: CacheMode::Auto,
            server_port: 3000,
            cleanup_interval: 60,
            metrics_capacity: 1000,
        }
    }
}

/// Sweep interval in seconds; 0 would turn the sweep into a busy loop.
fn sweep_interval(raw: Option<u64>, default: u64) -> u64 {
    raw.unwrap_or(default).max(MIN_CLEANUP_INTERVAL_SECS)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
