//! Threshold alerts.
//!
//! A metric name can carry a `{warning, critical}` pair. Recording a value at
//! or above either level produces an [`Alert`] that is handed to every
//! registered [`AlertSink`]. Sinks run inline on the recording path, so they
//! must not block: [`ChannelAlertSink`] hands alerts to another task for
//! anything slower than a log line.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Warning and critical levels for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub warning: f64,
    pub critical: f64,
}

impl Threshold {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }

    /// Level reached by `value`, if any.
    pub fn check(&self, value: f64) -> Option<AlertLevel> {
        if value >= self.critical {
            Some(AlertLevel::Critical)
        } else if value >= self.warning {
            Some(AlertLevel::Warning)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold crossing.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub metric: String,
    pub level: AlertLevel,
    pub value: f64,
    pub threshold: Threshold,
}

/// Receiver of threshold alerts. Must return quickly and never panic.
pub trait AlertSink: Send + Sync {
    fn notify(&self, alert: &Alert);
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn notify(&self, alert: &Alert) {
        match alert.level {
            AlertLevel::Critical => error!(
                metric = %alert.metric,
                value = alert.value,
                critical = alert.threshold.critical,
                "metric crossed critical threshold"
            ),
            AlertLevel::Warning => warn!(
                metric = %alert.metric,
                value = alert.value,
                warning = alert.threshold.warning,
                "metric crossed warning threshold"
            ),
        }
    }
}

/// Forwards alerts over an unbounded channel to an external monitor.
///
/// Sending never blocks; alerts are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    sender: mpsc::UnboundedSender<Alert>,
}

impl ChannelAlertSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl AlertSink for ChannelAlertSink {
    fn notify(&self, alert: &Alert) {
        let _ = self.sender.send(alert.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_levels() {
        let threshold = Threshold::new(100.0, 500.0);

        assert_eq!(threshold.check(99.9), None);
        assert_eq!(threshold.check(100.0), Some(AlertLevel::Warning));
        assert_eq!(threshold.check(499.0), Some(AlertLevel::Warning));
        assert_eq!(threshold.check(500.0), Some(AlertLevel::Critical));
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, receiver) = ChannelAlertSink::new();
        drop(receiver);

        sink.notify(&Alert {
            metric: "db.query".to_string(),
            level: AlertLevel::Warning,
            value: 150.0,
            threshold: Threshold::new(100.0, 500.0),
        });
    }
}
