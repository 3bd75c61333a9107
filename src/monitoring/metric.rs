//! Metric record types.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Unit of a recorded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricUnit {
    Milliseconds,
    Bytes,
    Count,
    Percent,
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self {
            MetricUnit::Milliseconds => "ms",
            MetricUnit::Bytes => "bytes",
            MetricUnit::Count => "count",
            MetricUnit::Percent => "%",
        };
        f.write_str(unit)
    }
}

/// One recorded sample.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetric {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, Value>,
}

impl PerformanceMetric {
    pub fn new(name: impl Into<String>, value: f64, unit: MetricUnit) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// A duration sample in milliseconds.
    pub fn timing(name: impl Into<String>, millis: f64) -> Self {
        Self::new(name, millis, MetricUnit::Milliseconds)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the sample was tagged as a failed operation.
    pub fn is_error(&self) -> bool {
        self.metadata
            .get("error")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Aggregate over the retained samples of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub average: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    /// Samples tagged `error: true`
    pub errors: usize,
}
