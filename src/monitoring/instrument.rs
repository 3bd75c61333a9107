//! Timing wrappers for arbitrary operations.

use std::future::Future;
use std::time::Instant;

use crate::monitoring::{PerformanceMetric, PerformanceMonitor};

/// Describes the call being timed.
#[derive(Debug, Clone, Copy)]
pub struct CallInfo<'a> {
    pub method: &'a str,
    pub arg_count: usize,
}

impl<'a> CallInfo<'a> {
    pub fn new(method: &'a str, arg_count: usize) -> Self {
        Self { method, arg_count }
    }
}

/// Awaits `operation` and records its duration under `name`, tagged with
/// `method`, `arg_count` and whether it returned an error. The result is
/// passed through untouched.
pub async fn instrument<T, E, Fut>(
    monitor: &PerformanceMonitor,
    name: &str,
    call: CallInfo<'_>,
    operation: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    let result = operation.await;
    let elapsed = started.elapsed().as_secs_f64() * 1000.0;

    monitor.record(
        PerformanceMetric::timing(name, elapsed)
            .with_metadata("method", call.method)
            .with_metadata("arg_count", call.arg_count)
            .with_metadata("error", result.is_err()),
    );
    result
}

/// Synchronous counterpart of [`instrument`].
pub fn instrument_sync<T, E>(
    monitor: &PerformanceMonitor,
    name: &str,
    call: CallInfo<'_>,
    operation: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let started = Instant::now();
    let result = operation();
    let elapsed = started.elapsed().as_secs_f64() * 1000.0;

    monitor.record(
        PerformanceMetric::timing(name, elapsed)
            .with_metadata("method", call.method)
            .with_metadata("arg_count", call.arg_count)
            .with_metadata("error", result.is_err()),
    );
    result
}
