//! TTL Cleanup Task
//!
//! Background task that periodically removes expired tier-1 entries, so
//! entries nobody reads again do not hold memory until eviction.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedMemoryStore;

// == Sweep Handle ==
/// Owns the running sweep task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the sweep task.
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a background task that periodically cleans up expired entries.
///
/// The task sleeps for `interval` between runs and takes the store's write
/// lock only for the duration of one sweep.
///
/// # Arguments
/// * `store` - Shared tier-1 store
/// * `interval` - Time between sweeps
///
/// # Example
/// ```ignore
/// let cache = TieredCache::new(MemoryStore::new(1 << 20, Duration::from_secs(300)));
/// let sweeper = spawn_cleanup_task(cache.local().clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweeper.stop();
/// ```
pub fn spawn_cleanup_task<V>(store: SharedMemoryStore<V>, interval: Duration) -> SweepHandle
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting TTL cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut store_guard = store.write().await;
                let removed = store_guard.cleanup_expired();
                (removed, store_guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "TTL cleanup: removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    });

    SweepHandle { handle }
}
