//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Every cache call is
//! timed through the shared [`PerformanceMonitor`].

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{MemoryStore, TieredCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    GetResponse, HealthResponse, KeysResponse, MessageResponse, MetricsResponse, SetRequest,
    StatsResponse,
};
use crate::monitoring::{instrument, CallInfo, PerformanceMonitor};

/// Application state shared across all handlers.
///
/// Both fields are cheap handles over shared state, so cloning the state per
/// request is fine.
#[derive(Clone)]
pub struct AppState {
    /// Two-tier cache holding arbitrary JSON values
    pub cache: TieredCache<Value>,
    /// Timing samples for cache operations and HTTP requests
    pub monitor: PerformanceMonitor,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: TieredCache<Value>, monitor: PerformanceMonitor) -> Self {
        Self { cache, monitor }
    }

    /// Memory-only state, used by tests and embedded setups.
    pub fn in_memory(store: MemoryStore<Value>) -> Self {
        Self::new(TieredCache::new(store), PerformanceMonitor::new())
    }

    /// Creates a new AppState from configuration.
    ///
    /// # Errors
    /// Returns [`CacheError::Config`] for contradictory remote settings.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let cache = TieredCache::from_config(config).await?;
        let monitor = PerformanceMonitor::with_capacity(config.metrics_capacity);
        Ok(Self::new(cache, monitor))
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in both tiers with an optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl();
    let SetRequest { key, value, .. } = req;
    instrument(
        &state.monitor,
        "cache.set",
        CallInfo::new("set", 3),
        state.cache.set(&key, value, ttl),
    )
    .await?;

    Ok(Json(MessageResponse::set(key)))
}

/// Handler for GET /get/:key
///
/// Reads through both tiers. A miss everywhere is a 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = instrument(&state.monitor, "cache.get", CallInfo::new("get", 1), async {
        state
            .cache
            .get(&key)
            .await
            .ok_or_else(|| CacheError::NotFound(key.clone()))
    })
    .await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    instrument(
        &state.monitor,
        "cache.delete",
        CallInfo::new("delete", 1),
        async {
            if state.cache.delete(&key).await {
                Ok(())
            } else {
                Err(CacheError::NotFound(key.clone()))
            }
        },
    )
    .await?;

    Ok(Json(MessageResponse::deleted(key)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    instrument(
        &state.monitor,
        "cache.clear",
        CallInfo::new("clear", 0),
        async {
            state.cache.clear().await;
            Ok::<_, CacheError>(())
        },
    )
    .await?;

    Ok(Json(MessageResponse::cleared()))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.keys().await))
}

/// Handler for GET /stats
///
/// Returns tier-1 statistics and the remote tier's state.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /metrics
///
/// Returns the timing summary of every recorded metric.
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        metrics: state.monitor.summaries(),
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let remote_connected = state.cache.remote().map(|remote| remote.is_connected());
    Json(HealthResponse::new(remote_connected))
}
