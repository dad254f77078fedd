//! JSON Record Decoder
//!
//! Reference decoder for records stored as flat JSON objects. Each namespace
//! declares its field list up front; reading an undeclared field fails the
//! same way a compiled binary schema would.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::schema::{ParsedRecord, RecordDecoder, SchemaType};

// == Record Schema ==
/// Declared field set of a namespace's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Schema identifier
    pub schema_id: String,
    /// Declared field names
    pub fields: Vec<String>,
}

impl RecordSchema {
    /// Creates a schema from an id and its field names.
    pub fn new<I, S>(schema_id: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schema_id: schema_id.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

// == JSON Record Decoder ==
/// Decodes records stored as flat JSON objects.
///
/// Strings, numbers, and booleans read as strings; `null` and absent keys
/// read as no value; nested arrays or objects are rejected.
#[derive(Debug, Clone)]
pub struct JsonRecordDecoder {
    /// Declared field names, shared with every parsed record
    fields: Arc<HashSet<String>>,
}

impl JsonRecordDecoder {
    /// Creates a decoder accepting the fields declared by `schema`.
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            fields: Arc::new(schema.fields.into_iter().collect()),
        }
    }

    /// Encodes field/value pairs into a record buffer.
    ///
    /// Fields left out are read back as `None`.
    pub fn encode(&self, values: &[(&str, &str)]) -> Result<Vec<u8>, DecodeError> {
        let mut object = Map::new();
        for (field, value) in values {
            if !self.fields.contains(*field) {
                return Err(DecodeError::UnknownField(field.to_string()));
            }
            object.insert(field.to_string(), Value::String(value.to_string()));
        }
        serde_json::to_vec(&Value::Object(object))
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

impl RecordDecoder for JsonRecordDecoder {
    fn parse(&self, bytes: &[u8]) -> Result<Box<dyn ParsedRecord>, DecodeError> {
        let values: Map<String, Value> =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        Ok(Box::new(JsonRecord {
            fields: Arc::clone(&self.fields),
            values,
        }))
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Json
    }
}

struct JsonRecord {
    fields: Arc<HashSet<String>>,
    values: Map<String, Value>,
}

impl ParsedRecord for JsonRecord {
    fn read_field(&self, name: &str) -> Result<Option<String>, DecodeError> {
        if !self.fields.contains(name) {
            return Err(DecodeError::UnknownField(name.to_string()));
        }

        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(DecodeError::NotScalar {
                field: name.to_string(),
            }),
        }
    }
}
