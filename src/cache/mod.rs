//! Cache Module
//!
//! Two-tier caching: a bounded in-memory store with TTL expiration and
//! hit-count eviction, an optional Redis-backed shared store, and the
//! façade that combines them.

pub mod clock;
mod entry;
mod eviction;
mod memoize;
mod redis_store;
mod remote;
mod stats;
mod store;
mod tiered;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{estimate_size, CacheEntry};
pub use eviction::{eviction_order, select_victims};
pub use memoize::Memoized;
pub use redis_store::{RedisStore, RECONNECT_BACKOFF};
pub use remote::{ttl_to_secs, RemoteStore};
pub use stats::CacheStats;
pub use store::{MemoryStore, SharedMemoryStore};
pub use tiered::{TieredCache, TieredStats};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;
