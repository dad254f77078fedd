//! Schema Module
//!
//! Decoder seam between raw store bytes and named record fields. The cache
//! core only sees the `RecordDecoder` / `ParsedRecord` traits; the binary
//! format behind them belongs to whoever registers the decoder.

mod json;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

pub use json::{JsonRecordDecoder, RecordSchema};

// == Schema Type ==
/// Encoding family of a namespace's records.
///
/// Each variant has one decoder implementation; namespaces pick theirs by
/// this tag in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    /// Flat JSON objects, decoded by [`JsonRecordDecoder`]
    #[default]
    Json,
}

impl SchemaType {
    /// Builds the decoder for this encoding over `schema`.
    pub fn decoder(self, schema: RecordSchema) -> Arc<dyn RecordDecoder> {
        match self {
            SchemaType::Json => Arc::new(JsonRecordDecoder::new(schema)),
        }
    }
}

// == Parsed Record ==
/// A record decoded from raw bytes, readable field by field.
pub trait ParsedRecord: Send {
    /// Reads a field as a string.
    ///
    /// Returns `Ok(None)` when the field is declared but holds no value, and
    /// `Err(DecodeError::UnknownField)` when the schema does not declare it.
    fn read_field(&self, name: &str) -> Result<Option<String>, DecodeError>;
}

// == Record Decoder ==
/// Parses raw bytes into a `ParsedRecord` for one namespace schema.
pub trait RecordDecoder: Send + Sync {
    /// Parses a raw buffer, failing with `DecodeError::Malformed` on bad input.
    fn parse(&self, bytes: &[u8]) -> Result<Box<dyn ParsedRecord>, DecodeError>;

    /// Encoding family this decoder reads.
    fn schema_type(&self) -> SchemaType;
}

/// Reads `column` from `record` as an integer timestamp.
///
/// The value must be a bare integer; surrounding whitespace is rejected.
pub fn read_timestamp(record: &dyn ParsedRecord, column: &str) -> Result<i64, DecodeError> {
    let raw = record.read_field(column)?;
    raw.as_deref()
        .and_then(|value| value.parse::<i64>().ok())
        .ok_or_else(|| DecodeError::InvalidTimestamp {
            column: column.to_string(),
            value: raw,
        })
}

// == Schema Registry ==
/// Maps namespace names to their record decoder.
#[derive(Default)]
pub struct SchemaRegistry {
    decoders: RwLock<HashMap<String, Arc<dyn RecordDecoder>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the decoder for a namespace.
    pub fn register(&self, namespace: impl Into<String>, decoder: Arc<dyn RecordDecoder>) {
        let mut decoders = self
            .decoders
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        decoders.insert(namespace.into(), decoder);
    }

    /// Encoding family registered for `namespace`, if any.
    pub fn schema_type_for(&self, namespace: &str) -> Option<SchemaType> {
        self.decoder_for(namespace)
            .ok()
            .map(|decoder| decoder.schema_type())
    }

    /// Returns the decoder registered for `namespace`.
    pub fn decoder_for(&self, namespace: &str) -> Result<Arc<dyn RecordDecoder>, DecodeError> {
        let decoders = self
            .decoders
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        decoders
            .get(namespace)
            .cloned()
            .ok_or_else(|| DecodeError::NoSchema(namespace.to_string()))
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let decoders = self
            .decoders
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_struct("SchemaRegistry")
            .field("namespaces", &decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}
