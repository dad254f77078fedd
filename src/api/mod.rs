//! API Module
//!
//! HTTP handlers and routing for the lookup cache REST API.
//!
//! # Endpoints
//! - `GET /lookup/:namespace/:key` - Look up a field of a cached record
//! - `PUT /merge/:namespace/:key` - Merge a record into the cache
//! - `POST /feed/:namespace` - Queue a batch of records for merge
//! - `GET /namespaces` - List namespaces
//! - `GET /namespaces/:namespace` - Namespace state and high-water mark
//! - `GET /stats` - Telemetry counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
