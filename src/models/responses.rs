//! Response DTOs for the cache HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::TieredStats;
use crate::monitoring::MetricSummary;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for mutating operations (PUT /set, DELETE /del/:key, POST /clear)
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Success message
    pub message: String,
    /// The key affected, absent for whole-cache operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl MessageResponse {
    pub fn set(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key: Some(key),
        }
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key: Some(key),
        }
    }

    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared".to_string(),
            key: None,
        }
    }
}

/// Response body for the keys endpoint (GET /keys)
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub count: usize,
    pub keys: Vec<String>,
}

impl KeysResponse {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Current number of tier-1 entries
    pub count: usize,
    pub memory_usage: usize,
    pub max_memory_usage: usize,
    pub utilization_percent: f64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub remote_enabled: bool,
    pub remote_connected: bool,
}

impl From<TieredStats> for StatsResponse {
    fn from(stats: TieredStats) -> Self {
        let local = stats.local;
        Self {
            hit_rate: local.hit_rate(),
            count: local.count,
            memory_usage: local.memory_usage,
            max_memory_usage: local.max_memory_usage,
            utilization_percent: local.utilization_percent,
            hits: local.hits,
            misses: local.misses,
            evictions: local.evictions,
            expirations: local.expirations,
            remote_enabled: stats.remote_enabled,
            remote_connected: stats.remote_connected,
        }
    }
}

/// Response body for the metrics endpoint (GET /metrics)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    pub metrics: BTreeMap<String, MetricSummary>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Whether the remote tier is reachable, absent when not configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_connected: Option<bool>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp.
    ///
    /// A disconnected remote tier reports "degraded": the cache still serves
    /// requests from tier-1.
    pub fn new(remote_connected: Option<bool>) -> Self {
        let status = match remote_connected {
            Some(false) => "degraded",
            _ => "healthy",
        };
        Self {
            status: status.to_string(),
            remote_connected,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", json!({"salary": 120000}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("120000"));
    }

    #[test]
    fn test_message_responses() {
        let set = serde_json::to_value(MessageResponse::set("my_key")).unwrap();
        assert_eq!(set["key"], "my_key");
        assert!(set["message"].as_str().unwrap().contains("successfully"));

        let cleared = serde_json::to_value(MessageResponse::cleared()).unwrap();
        assert!(cleared.get("key").is_none());
    }

    #[test]
    fn test_stats_response_from_tiered_stats() {
        let mut local = CacheStats::new();
        local.record_hit();
        local.record_hit();
        local.record_hit();
        local.record_miss();
        local.set_usage(2, 50, 200);

        let resp = StatsResponse::from(TieredStats {
            local,
            remote_enabled: false,
            remote_connected: false,
        });
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
        assert_eq!(resp.utilization_percent, 25.0);
        assert_eq!(resp.count, 2);
    }

    #[test]
    fn test_health_response_status() {
        assert_eq!(HealthResponse::new(None).status, "healthy");
        assert_eq!(HealthResponse::new(Some(true)).status, "healthy");
        assert_eq!(HealthResponse::new(Some(false)).status, "degraded");

        let json = serde_json::to_string(&HealthResponse::new(None)).unwrap();
        assert!(json.contains("timestamp"));
        assert!(!json.contains("remote_connected"));
    }
}
