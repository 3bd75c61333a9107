//! Tiered Cache - a two-level cache with instrumentation
//!
//! A bounded in-memory store with TTL expiration and hit-count eviction,
//! backed by an optional Redis tier, plus timing/metrics helpers and
//! debounce/throttle wrappers. Ships with an HTTP server exposing the cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod pacing;
pub mod tasks;
pub mod telemetry;

pub use api::{create_router, AppState};
pub use cache::{MemoryStore, RedisStore, RemoteStore, TieredCache};
pub use config::{CacheMode, Config, RemoteConfig};
pub use error::{CacheError, Result};
pub use monitoring::{PerformanceMonitor, Timer};
pub use tasks::{spawn_cleanup_task, SweepHandle};
