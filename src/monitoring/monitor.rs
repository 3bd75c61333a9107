//! Performance monitor.
//!
//! Keeps the most recent samples per metric name in a ring buffer, answers
//! averages and summaries over them, checks thresholds, and mirrors every
//! sample into the `metrics` facade.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

use crate::monitoring::{
    Alert, AlertSink, LogAlertSink, MetricSummary, PerformanceMetric, Threshold,
};
use crate::telemetry;

/// Samples kept per metric by [`PerformanceMonitor::new`].
pub const DEFAULT_CAPACITY: usize = 100;

/// Samples kept per metric by the long-running monitoring variant.
pub const MONITORING_CAPACITY: usize = 1000;

struct Inner {
    capacity: usize,
    series: Mutex<HashMap<String, VecDeque<PerformanceMetric>>>,
    thresholds: RwLock<HashMap<String, Threshold>>,
    sinks: RwLock<Vec<Arc<dyn AlertSink>>>,
}

// == Performance Monitor ==
/// Shared, cheaply clonable sample store.
#[derive(Clone)]
pub struct PerformanceMonitor {
    inner: Arc<Inner>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    /// Monitor keeping [`DEFAULT_CAPACITY`] samples per metric, logging alerts.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Monitor keeping `capacity` samples per metric (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity: capacity.max(1),
                series: Mutex::new(HashMap::new()),
                thresholds: RwLock::new(HashMap::new()),
                sinks: RwLock::new(vec![Arc::new(LogAlertSink)]),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    // == Configuration ==
    pub fn set_threshold(&self, name: impl Into<String>, threshold: Threshold) {
        let mut thresholds = self
            .inner
            .thresholds
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        thresholds.insert(name.into(), threshold);
    }

    /// Registers an extra alert receiver next to the log sink.
    pub fn add_alert_sink(&self, sink: Arc<dyn AlertSink>) {
        let mut sinks = self
            .inner
            .sinks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sinks.push(sink);
    }

    // == Timing ==
    /// Starts timing an operation; call [`Timer::stop`] to record it.
    pub fn start_timer(&self, label: impl Into<String>) -> Timer {
        Timer {
            monitor: self.clone(),
            label: label.into(),
            started: Instant::now(),
            metric: None,
        }
    }

    // == Record ==
    /// Appends a sample, dropping the oldest one for that name at capacity.
    pub fn record(&self, metric: PerformanceMetric) {
        metrics::histogram!(telemetry::OPERATION_DURATION_MS, "operation" => metric.name.clone())
            .record(metric.value);

        let alert = self.check_threshold(&metric);

        {
            let mut series = self.series();
            let samples = series.entry(metric.name.clone()).or_default();
            if samples.len() >= self.inner.capacity {
                samples.pop_front();
            }
            samples.push_back(metric);
        }

        if let Some(alert) = alert {
            self.notify(&alert);
        }
    }

    // == Queries ==
    /// Average of the retained samples for `label`, 0 without samples.
    pub fn average(&self, label: &str) -> f64 {
        self.summary(label).map(|s| s.average).unwrap_or(0.0)
    }

    pub fn summary(&self, label: &str) -> Option<MetricSummary> {
        self.series().get(label).and_then(summarize)
    }

    /// Summary per metric name, sorted by name.
    pub fn summaries(&self) -> BTreeMap<String, MetricSummary> {
        self.series()
            .iter()
            .filter_map(|(name, samples)| summarize(samples).map(|s| (name.clone(), s)))
            .collect()
    }

    /// Retained samples for `label`, oldest first.
    pub fn samples(&self, label: &str) -> Vec<PerformanceMetric> {
        self.series()
            .get(label)
            .map(|samples| samples.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.series().clear();
    }

    fn series(&self) -> MutexGuard<'_, HashMap<String, VecDeque<PerformanceMetric>>> {
        self.inner
            .series
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_threshold(&self, metric: &PerformanceMetric) -> Option<Alert> {
        let thresholds = self
            .inner
            .thresholds
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let threshold = *thresholds.get(&metric.name)?;
        threshold.check(metric.value).map(|level| Alert {
            metric: metric.name.clone(),
            level,
            value: metric.value,
            threshold,
        })
    }

    fn notify(&self, alert: &Alert) {
        metrics::counter!(
            telemetry::ALERTS_TOTAL,
            "operation" => alert.metric.clone(),
            "level" => alert.level.as_str()
        )
        .increment(1);

        let sinks = self
            .inner
            .sinks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for sink in sinks {
            sink.notify(alert);
        }
    }
}

fn summarize(samples: &VecDeque<PerformanceMetric>) -> Option<MetricSummary> {
    if samples.is_empty() {
        return None;
    }
    let count = samples.len();
    let total: f64 = samples.iter().map(|m| m.value).sum();
    let min = samples.iter().map(|m| m.value).fold(f64::INFINITY, f64::min);
    let max = samples.iter().map(|m| m.value).fold(f64::NEG_INFINITY, f64::max);
    let errors = samples.iter().filter(|m| m.is_error()).count();
    Some(MetricSummary {
        average: total / count as f64,
        count,
        min,
        max,
        errors,
    })
}

// == Timer ==
/// Running measurement started by [`PerformanceMonitor::start_timer`].
///
/// Dropping a timer without calling [`Timer::stop`] records nothing.
pub struct Timer {
    monitor: PerformanceMonitor,
    label: String,
    started: Instant,
    metric: Option<PerformanceMetric>,
}

impl Timer {
    /// Attaches metadata to the sample recorded on stop.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let metric = self
            .metric
            .take()
            .unwrap_or_else(|| PerformanceMetric::timing(self.label.clone(), 0.0));
        self.metric = Some(metric.with_metadata(key, value));
        self
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Records the elapsed time under the timer's label.
    pub fn stop(self) {
        let elapsed = self.elapsed_ms();
        let mut metric = self
            .metric
            .unwrap_or_else(|| PerformanceMetric::timing(self.label, 0.0));
        metric.value = elapsed;
        self.monitor.record(metric);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::{AlertLevel, ChannelAlertSink, MetricUnit};

    fn sample(name: &str, value: f64) -> PerformanceMetric {
        PerformanceMetric::timing(name, value)
    }

    #[test]
    fn test_average_without_samples_is_zero() {
        let monitor = PerformanceMonitor::new();
        assert_eq!(monitor.average("missing"), 0.0);
        assert!(monitor.summaries().is_empty());
    }

    #[test]
    fn test_average_and_summary() {
        let monitor = PerformanceMonitor::new();
        monitor.record(sample("query", 10.0));
        monitor.record(sample("query", 30.0));
        monitor.record(sample("render", 5.0));

        assert_eq!(monitor.average("query"), 20.0);

        let summaries = monitor.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries["query"].count, 2);
        assert_eq!(summaries["query"].min, 10.0);
        assert_eq!(summaries["query"].max, 30.0);
        assert_eq!(summaries["render"].average, 5.0);
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let monitor = PerformanceMonitor::with_capacity(3);
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            monitor.record(sample("op", value));
        }

        let values: Vec<f64> = monitor.samples("op").iter().map(|m| m.value).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0]);
        assert_eq!(monitor.average("op"), 4.0);
    }

    #[test]
    fn test_timer_records_elapsed_time() {
        let monitor = PerformanceMonitor::new();

        let timer = monitor.start_timer("sleepy").with_metadata("method", "nap");
        std::thread::sleep(std::time::Duration::from_millis(20));
        timer.stop();

        let samples = monitor.samples("sleepy");
        assert_eq!(samples.len(), 1);
        assert!(samples[0].value >= 20.0);
        assert_eq!(samples[0].unit, MetricUnit::Milliseconds);
        assert_eq!(samples[0].metadata["method"], "nap");
    }

    #[test]
    fn test_dropped_timer_records_nothing() {
        let monitor = PerformanceMonitor::new();
        drop(monitor.start_timer("abandoned"));
        assert!(monitor.samples("abandoned").is_empty());
    }

    #[test]
    fn test_threshold_alerts_reach_sinks() {
        let monitor = PerformanceMonitor::new();
        let (sink, mut alerts) = ChannelAlertSink::new();
        monitor.add_alert_sink(Arc::new(sink));
        monitor.set_threshold("db.query", Threshold::new(100.0, 500.0));

        monitor.record(sample("db.query", 50.0));
        monitor.record(sample("db.query", 150.0));
        monitor.record(sample("db.query", 900.0));
        monitor.record(sample("other", 10_000.0));

        let first = alerts.try_recv().unwrap();
        assert_eq!(first.level, AlertLevel::Warning);
        assert_eq!(first.value, 150.0);

        let second = alerts.try_recv().unwrap();
        assert_eq!(second.level, AlertLevel::Critical);
        assert!(alerts.try_recv().is_err(), "unconfigured metrics never alert");

        assert_eq!(monitor.samples("db.query").len(), 3);
    }

    #[test]
    fn test_clones_share_samples() {
        let monitor = PerformanceMonitor::new();
        let handle = monitor.clone();

        handle.record(sample("shared", 1.0));
        assert_eq!(monitor.summary("shared").unwrap().count, 1);

        monitor.clear();
        assert!(handle.summary("shared").is_none());
    }
}
