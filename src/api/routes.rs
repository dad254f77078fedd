//! API Routes
//!
//! Configures the Axum router with all lookup cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    feed_handler, health_handler, list_namespaces_handler, lookup_handler, merge_handler,
    namespace_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/lookup/:namespace/:key", get(lookup_handler))
        .route("/merge/:namespace/:key", put(merge_handler))
        .route("/feed/:namespace", post(feed_handler))
        .route("/namespaces", get(list_namespaces_handler))
        .route("/namespaces/:namespace", get(namespace_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
