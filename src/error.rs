//! Error types for the lookup cache
//!
//! Provides unified error handling using thiserror. The reader and merger
//! never return these to their callers; they are caught at that boundary,
//! logged, and reported to telemetry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error ==
/// Failures raised by a key-value store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend I/O failure on get or put
    #[error("Store I/O failure: {0}")]
    Io(String),
}

// == Decode Error ==
/// Failures raised while parsing a record or reading one of its fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The raw buffer could not be parsed as a record
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// The field is not declared by the record schema
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The field holds a value that cannot be read as a string
    #[error("Field {field} is not a scalar value")]
    NotScalar { field: String },

    /// The timestamp column is absent or not an integer
    #[error("Invalid timestamp in column {column}: {value:?}")]
    InvalidTimestamp {
        column: String,
        value: Option<String>,
    },

    /// No decoder is registered for the namespace
    #[error("No schema registered for namespace: {0}")]
    NoSchema(String),
}

// == Cache Error Enum ==
/// Unified error type for the lookup cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Store get/put failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Record decode failure
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Plain lookup issued without a value column
    #[error("No value column given for lookup")]
    MissingValueColumn,

    /// Namespace is not registered
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::MissingValueColumn => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the lookup cache.
pub type Result<T> = std::result::Result<T, CacheError>;
