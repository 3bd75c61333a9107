//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is alive.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired tier-1 entries at configured intervals

mod cleanup;

pub use cleanup::{spawn_cleanup_task, SweepHandle};
