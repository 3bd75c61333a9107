//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /clear` - Remove every key
//! - `GET /keys` - List live keys
//! - `GET /stats` - Get cache statistics
//! - `GET /metrics` - Get timing summaries
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::{track_requests, HTTP_REQUEST_METRIC};
pub use routes::create_router;
