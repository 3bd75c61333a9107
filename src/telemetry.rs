//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! # Common labels
//!
//! - `tier`: which tier answered: "local" or "remote"
//! - `operation`: remote command or instrumented operation name

/// Cache hits.
///
/// Labels: `tier` ("local" | "remote").
pub const CACHE_HITS_TOTAL: &str = "tiered_cache_hits_total";

/// Reads that missed every configured tier.
pub const CACHE_MISSES_TOTAL: &str = "tiered_cache_misses_total";

/// Tier-1 entries evicted to stay within the memory budget.
pub const CACHE_EVICTIONS_TOTAL: &str = "tiered_cache_evictions_total";

/// Remote commands that failed, timed out or hit a disconnected store.
///
/// Labels: `operation`.
pub const REMOTE_ERRORS_TOTAL: &str = "tiered_cache_remote_errors_total";

/// Durations recorded through the performance monitor, in milliseconds.
///
/// Labels: `operation`.
pub const OPERATION_DURATION_MS: &str = "tiered_cache_operation_duration_ms";

/// Threshold alerts raised by the performance monitor.
///
/// Labels: `operation`, `level` ("warning" | "critical").
pub const ALERTS_TOTAL: &str = "tiered_cache_alerts_total";
