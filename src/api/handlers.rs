//! API Handlers
//!
//! HTTP request handlers for each lookup cache endpoint. Cache actions block
//! on the store, so they run on tokio's blocking pool.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tokio::sync::mpsc;

use crate::cache::{
    CacheActionRunner, CacheMetrics, ExtractionNamespace, LookupResult, MemoryStore,
    NamespaceConfig, NamespaceRegistry, StoreHandle,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    FeedRequest, FeedResponse, HealthResponse, LookupQuery, LookupResponse, MergeResponse,
    NamespaceResponse, NamespacesResponse, StatsResponse,
};
use crate::schema::SchemaRegistry;
use crate::tasks::FeedRecord;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reader and merger over the shared store
    pub runner: Arc<CacheActionRunner>,
    /// Registered namespaces
    pub namespaces: Arc<NamespaceRegistry>,
    /// Telemetry counters
    pub metrics: Arc<CacheMetrics>,
    /// Sender side of the refresh feed
    pub feed: mpsc::Sender<FeedRecord>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(
        runner: Arc<CacheActionRunner>,
        namespaces: Arc<NamespaceRegistry>,
        metrics: Arc<CacheMetrics>,
        feed: mpsc::Sender<FeedRecord>,
    ) -> Self {
        Self {
            runner,
            namespaces,
            metrics,
            feed,
        }
    }

    /// Builds state over an in-memory store with JSON-decoded namespaces.
    ///
    /// Returns the receiver the ingest task should drain.
    pub fn with_namespaces(
        configs: &[NamespaceConfig],
        lock_stripes: usize,
        feed_buffer: usize,
    ) -> (Self, mpsc::Receiver<FeedRecord>) {
        let schemas = Arc::new(SchemaRegistry::new());
        let namespaces = Arc::new(NamespaceRegistry::new());
        for config in configs {
            schemas.register(
                config.namespace.clone(),
                config.schema_type.decoder(config.schema()),
            );
            namespaces.register(ExtractionNamespace::from_config(config));
        }

        let metrics = Arc::new(CacheMetrics::new());
        let store = StoreHandle::open_with(Arc::new(MemoryStore::new()));
        let runner = Arc::new(CacheActionRunner::new(
            store,
            schemas,
            metrics.clone(),
            lock_stripes,
        ));
        let (tx, rx) = mpsc::channel(feed_buffer.max(1));

        (Self::new(runner, namespaces, metrics, tx), rx)
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<(Self, mpsc::Receiver<FeedRecord>)> {
        let namespaces = config.load_namespaces()?;
        Ok(Self::with_namespaces(
            &namespaces,
            config.lock_stripes,
            config.feed_buffer,
        ))
    }

    fn namespace(&self, name: &str) -> Result<Arc<ExtractionNamespace>> {
        self.namespaces
            .get(name)
            .ok_or_else(|| CacheError::NamespaceNotFound(name.to_string()))
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CacheError::Internal(e.to_string()))
}

/// Handler for GET /lookup/:namespace/:key
///
/// 200 with the value when found, 404 when empty, 503 when unavailable.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
    Query(query): Query<LookupQuery>,
) -> Result<(StatusCode, Json<LookupResponse>)> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let decode_spec = query.decode_spec().map_err(CacheError::InvalidRequest)?;
    let ns = state.namespace(&namespace)?;

    let runner = state.runner.clone();
    let lookup_key = key.clone();
    let result = run_blocking(move || {
        runner.get_cache_value(&ns, &lookup_key, query.field.as_deref(), decode_spec.as_ref())
    })
    .await?;

    let status = match result {
        LookupResult::Found(_) => StatusCode::OK,
        LookupResult::Empty => StatusCode::NOT_FOUND,
        LookupResult::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    Ok((status, Json(LookupResponse::new(key, &result))))
}

/// Handler for PUT /merge/:namespace/:key
///
/// The body is the encoded record. Always 200 for a known namespace; the
/// outcome field says whether the record was written.
pub async fn merge_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<MergeResponse>> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    let ns = state.namespace(&namespace)?;

    let runner = state.runner.clone();
    let merge_key = key.clone();
    let outcome = run_blocking(move || runner.update_cache(&ns, &merge_key, &body)).await?;

    Ok(Json(MergeResponse::new(key, outcome)))
}

/// Handler for POST /feed/:namespace
///
/// Queues the batch onto the ingest task and answers 202 without waiting
/// for the merges.
pub async fn feed_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    Json(req): Json<FeedRequest>,
) -> Result<(StatusCode, Json<FeedResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let ns = state.namespace(&namespace)?;

    let accepted = req.records.len();
    for item in req.records {
        let record = FeedRecord {
            namespace: ns.clone(),
            key: item.key,
            value: item.value.into_bytes(),
        };
        state
            .feed
            .send(record)
            .await
            .map_err(|_| CacheError::Internal("refresh feed is closed".to_string()))?;
    }

    Ok((StatusCode::ACCEPTED, Json(FeedResponse { accepted })))
}

/// Handler for GET /namespaces
pub async fn list_namespaces_handler(State(state): State<AppState>) -> Json<NamespacesResponse> {
    Json(NamespacesResponse {
        namespaces: state.namespaces.names(),
    })
}

/// Handler for GET /namespaces/:namespace
pub async fn namespace_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<NamespaceResponse>> {
    let ns = state.namespace(&namespace)?;
    let mut response = NamespaceResponse::from(ns.as_ref());
    response.schema_type = state.runner.schema_type(&namespace);
    Ok(Json(response))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.metrics.snapshot()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.runner.store().is_open()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_namespaces;

    fn state() -> (AppState, mpsc::Receiver<FeedRecord>) {
        AppState::with_namespaces(&default_namespaces(), 8, 8)
    }

    fn field_query(field: &str) -> Query<LookupQuery> {
        Query(LookupQuery {
            field: Some(field.to_string()),
            ..Default::default()
        })
    }

    fn path(namespace: &str, key: &str) -> Path<(String, String)> {
        Path((namespace.to_string(), key.to_string()))
    }

    #[tokio::test]
    async fn test_merge_and_lookup_handler() {
        let (state, _feed) = state();

        let body = Bytes::from_static(br#"{"value":"a","last_updated":"100"}"#);
        let Json(merged) = merge_handler(State(state.clone()), path("default", "k1"), body)
            .await
            .unwrap();
        assert_eq!(merged.outcome, crate::cache::MergeOutcome::Written);

        let (status, Json(found)) = lookup_handler(
            State(state.clone()),
            path("default", "k1"),
            field_query("value"),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.value.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_lookup_unknown_namespace() {
        let (state, _feed) = state();

        let result = lookup_handler(State(state), path("missing", "k1"), field_query("value")).await;
        assert!(matches!(result, Err(CacheError::NamespaceNotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_without_field_is_rejected() {
        let (state, _feed) = state();

        let result = lookup_handler(
            State(state),
            path("default", "k1"),
            Query(LookupQuery::default()),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_lookup_closed_store_is_unavailable() {
        let (state, _feed) = state();
        state.runner.store().close();

        let (status, Json(resp)) = lookup_handler(
            State(state.clone()),
            path("default", "k1"),
            field_query("value"),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.status, "unavailable");

        let Json(health) = health_handler(State(state)).await;
        assert!(!health.store_open);
    }

    #[tokio::test]
    async fn test_feed_handler_enqueues_records() {
        let (state, mut feed) = state();

        let req = FeedRequest {
            records: vec![crate::models::FeedItem {
                key: "k1".to_string(),
                value: r#"{"last_updated":"1"}"#.to_string(),
            }],
        };
        let (status, Json(resp)) = feed_handler(State(state), Path("default".to_string()), Json(req))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(resp.accepted, 1);

        let queued = feed.recv().await.unwrap();
        assert_eq!(queued.key, "k1");
        assert_eq!(queued.namespace.namespace(), "default");
    }

    #[tokio::test]
    async fn test_namespace_handler_reports_watermark() {
        let (state, _feed) = state();

        let body = Bytes::from_static(br#"{"value":"a","last_updated":"42"}"#);
        merge_handler(State(state.clone()), path("default", "k1"), body)
            .await
            .unwrap();

        let Json(ns) = namespace_handler(State(state.clone()), Path("default".to_string()))
            .await
            .unwrap();
        assert_eq!(ns.last_updated_time, 42);
        assert_eq!(ns.schema_type, Some(crate::schema::SchemaType::Json));

        let Json(stats) = stats_handler(State(state)).await;
        assert_eq!(stats.update_cache_success, 1);
    }
}
