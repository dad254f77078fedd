//! Response DTOs for the lookup cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{ExtractionNamespace, LookupResult, MergeOutcome, MetricsSnapshot};
use crate::schema::SchemaType;

/// Response body of `GET /lookup/:namespace/:key`
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    /// The requested key
    pub key: String,
    /// One of `found`, `empty`, `unavailable`
    pub status: &'static str,
    /// The selected value, present only when found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl LookupResponse {
    /// Creates a LookupResponse from a lookup result
    pub fn new(key: impl Into<String>, result: &LookupResult) -> Self {
        let (status, value) = match result {
            LookupResult::Found(bytes) => ("found", Some(String::from_utf8_lossy(bytes).into_owned())),
            LookupResult::Empty => ("empty", None),
            LookupResult::Unavailable => ("unavailable", None),
        };
        Self {
            key: key.into(),
            status,
            value,
        }
    }
}

/// Response body of `PUT /merge/:namespace/:key`
#[derive(Debug, Clone, Serialize)]
pub struct MergeResponse {
    /// The merged key
    pub key: String,
    /// What the merge did
    pub outcome: MergeOutcome,
}

impl MergeResponse {
    /// Creates a new MergeResponse
    pub fn new(key: impl Into<String>, outcome: MergeOutcome) -> Self {
        Self {
            key: key.into(),
            outcome,
        }
    }
}

/// Response body of `POST /feed/:namespace`
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    /// Records queued for merge
    pub accepted: usize,
}

/// Response body of `GET /namespaces/:namespace`
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceResponse {
    pub namespace: String,
    pub cache_enabled: bool,
    pub ts_column: String,
    pub schema_id: String,
    /// Encoding family of the registered decoder
    pub schema_type: Option<SchemaType>,
    /// Current high-water mark
    pub last_updated_time: i64,
}

impl From<&ExtractionNamespace> for NamespaceResponse {
    fn from(ns: &ExtractionNamespace) -> Self {
        Self {
            namespace: ns.namespace().to_string(),
            cache_enabled: ns.is_cache_enabled(),
            ts_column: ns.ts_column().to_string(),
            schema_id: ns.schema_id().to_string(),
            schema_type: None,
            last_updated_time: ns.last_updated_time(),
        }
    }
}

/// Response body of `GET /namespaces`
#[derive(Debug, Clone, Serialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<String>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups that failed to decode or read the store
    pub get_cache_value_failure: u64,
    /// Merges that completed
    pub update_cache_success: u64,
    /// Merges that caught a failure
    pub update_cache_failure: u64,
    /// update_cache_failure / (update_cache_success + update_cache_failure)
    pub merge_failure_rate: f64,
}

impl From<MetricsSnapshot> for StatsResponse {
    fn from(snapshot: MetricsSnapshot) -> Self {
        Self {
            get_cache_value_failure: snapshot.get_cache_value_failure,
            update_cache_success: snapshot.update_cache_success,
            update_cache_failure: snapshot.update_cache_failure,
            merge_failure_rate: snapshot.merge_failure_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (`healthy`, or `degraded` while the store is closed)
    pub status: String,
    /// Whether the store is open
    pub store_open: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new(store_open: bool) -> Self {
        Self {
            status: if store_open { "healthy" } else { "degraded" }.to_string(),
            store_open,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
