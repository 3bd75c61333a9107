//! Pacing Module
//!
//! Debounce and throttle wrappers for rate-limiting cache-populating calls
//! such as search-as-you-type.
//!
//! Both use tokio's clock, so tests can drive them with paused time.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

// == Debounce ==
/// Wraps `func` so only the last call in a burst runs, `wait` after it.
pub fn debounce<A, F>(func: F, wait: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        func: Arc::new(func),
        wait,
        pending: Mutex::new(None),
    }
}

/// A debounced function. Must be called from within a tokio runtime.
///
/// Dropping it discards any scheduled invocation.
pub struct Debounced<A> {
    func: Callback<A>,
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<A: Send + 'static> Debounced<A> {
    /// Cancels any scheduled invocation and schedules `func(args)` after
    /// the wait period.
    pub fn call(&self, args: A) {
        let func = Arc::clone(&self.func);
        let wait = self.wait;
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            func(args);
        }));
    }

    /// Drops the scheduled invocation, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// Whether an invocation is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl<A> Drop for Debounced<A> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl<A> fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced").field("wait", &self.wait).finish()
    }
}

// == Throttle ==
/// Wraps `func` so it runs at most once per `limit`, on the leading edge.
pub fn throttle<A, F>(func: F, limit: Duration) -> Throttled<A>
where
    F: Fn(A) + Send + Sync + 'static,
{
    Throttled {
        func: Arc::new(func),
        limit,
        last_run: Mutex::new(None),
    }
}

/// A throttled function.
pub struct Throttled<A> {
    func: Callback<A>,
    limit: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl<A> Throttled<A> {
    /// Runs `func(args)` now if the window since the last run has elapsed,
    /// otherwise drops the call. Returns whether it ran.
    pub fn call(&self, args: A) -> bool {
        let now = Instant::now();
        {
            let mut last_run = self.last_run.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(at) = *last_run {
                if now.duration_since(at) < self.limit {
                    return false;
                }
            }
            *last_run = Some(now);
        }
        (self.func)(args);
        true
    }

    /// Forgets the last run so the next call goes through.
    pub fn reset(&self) {
        *self.last_run.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

impl<A> fmt::Debug for Throttled<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled").field("limit", &self.limit).finish()
    }
}
