//! Monitoring Module
//!
//! Timing and metric collection around cache, database and request
//! operations, with threshold alerts.

mod instrument;
mod metric;
mod monitor;
mod threshold;

pub use instrument::{instrument, instrument_sync, CallInfo};
pub use metric::{MetricSummary, MetricUnit, PerformanceMetric};
pub use monitor::{PerformanceMonitor, Timer, DEFAULT_CAPACITY, MONITORING_CAPACITY};
pub use threshold::{Alert, AlertLevel, AlertSink, ChannelAlertSink, LogAlertSink, Threshold};
