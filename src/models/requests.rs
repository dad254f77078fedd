//! Request DTOs for the lookup cache API
//!
//! Defines the structure of incoming query strings and request bodies.

use serde::Deserialize;

use crate::cache::DecodeSpec;

/// Query string of `GET /lookup/:namespace/:key`
///
/// Either `field` alone, or all four decode columns (optionally with `field`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQuery {
    /// Column to return when no decode spec is given
    pub field: Option<String>,
    pub column_to_check: Option<String>,
    pub value_to_check: Option<String>,
    pub column_if_value_matched: Option<String>,
    pub column_if_value_not_matched: Option<String>,
}

impl LookupQuery {
    /// Builds the decode spec, if one was given.
    ///
    /// Returns an error message when only some of the four columns are set.
    pub fn decode_spec(&self) -> Result<Option<DecodeSpec>, String> {
        match (
            &self.column_to_check,
            &self.value_to_check,
            &self.column_if_value_matched,
            &self.column_if_value_not_matched,
        ) {
            (Some(check), Some(value), Some(matched), Some(not_matched)) => Ok(Some(
                DecodeSpec::new(check, value, matched, not_matched),
            )),
            (None, None, None, None) => Ok(None),
            _ => Err("Decode spec requires column_to_check, value_to_check, \
                 column_if_value_matched and column_if_value_not_matched"
                .to_string()),
        }
    }

    /// Validates the query
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.decode_spec() {
            Err(msg) => Some(msg),
            Ok(None) if self.field.as_deref().map_or(true, str::is_empty) => {
                Some("Lookup requires a field or a decode spec".to_string())
            }
            Ok(_) => None,
        }
    }
}

/// One record in a feed batch
#[derive(Debug, Clone, Deserialize)]
pub struct FeedItem {
    /// Cache key
    pub key: String,
    /// Encoded record
    pub value: String,
}

/// Request body of `POST /feed/:namespace`
#[derive(Debug, Clone, Deserialize)]
pub struct FeedRequest {
    pub records: Vec<FeedItem>,
}

impl FeedRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.records.is_empty() {
            return Some("Feed batch cannot be empty".to_string());
        }
        if self.records.iter().any(|r| r.key.is_empty()) {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}
