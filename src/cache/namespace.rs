//! Extraction Namespace Module
//!
//! Per-namespace state shared by the reader and merger: enable flag,
//! timestamp column, schema id, and the `last_updated_time` high-water mark.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::schema::{RecordSchema, SchemaType};

// == Namespace Config ==
/// Static description of a namespace, as loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Namespace name
    pub namespace: String,
    /// Whether `merge` may mutate this namespace
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Field holding the record timestamp
    pub ts_column: String,
    /// Schema id of the records
    pub schema_id: String,
    /// Encoding family of the records
    #[serde(default)]
    pub schema_type: SchemaType,
    /// Declared record fields
    pub fields: Vec<String>,
    /// Initial high-water mark
    #[serde(default)]
    pub last_updated_time: i64,
}

fn default_cache_enabled() -> bool {
    true
}

impl NamespaceConfig {
    /// Record schema declared by this namespace.
    pub fn schema(&self) -> RecordSchema {
        RecordSchema::new(self.schema_id.clone(), self.fields.iter().cloned())
    }
}

// == Extraction Namespace ==
/// Live state of one namespace.
///
/// Everything but the high-water mark is fixed at construction; the mark
/// only ever moves forward.
#[derive(Debug)]
pub struct ExtractionNamespace {
    /// Namespace name
    namespace: String,
    /// Whether `merge` may mutate this namespace
    cache_enabled: bool,
    /// Field holding the record timestamp
    ts_column: String,
    /// Schema id of the records
    schema_id: String,
    /// Greatest merged record timestamp
    last_updated_time: AtomicI64,
}

impl ExtractionNamespace {
    /// Creates a namespace with its high-water mark at zero.
    pub fn new(
        namespace: impl Into<String>,
        ts_column: impl Into<String>,
        schema_id: impl Into<String>,
        cache_enabled: bool,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            cache_enabled,
            ts_column: ts_column.into(),
            schema_id: schema_id.into(),
            last_updated_time: AtomicI64::new(0),
        }
    }

    /// Creates a namespace from configuration, starting the high-water mark
    /// at the configured value.
    pub fn from_config(config: &NamespaceConfig) -> Self {
        let ns = Self::new(
            config.namespace.clone(),
            config.ts_column.clone(),
            config.schema_id.clone(),
            config.cache_enabled,
        );
        ns.last_updated_time
            .store(config.last_updated_time, Ordering::Release);
        ns
    }

    /// Namespace name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether `merge` may mutate this namespace.
    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Field holding the record timestamp.
    pub fn ts_column(&self) -> &str {
        &self.ts_column
    }

    /// Schema id of the records.
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Store key under which `key` lives in this namespace.
    ///
    /// The namespace name is length-prefixed, so keys of different
    /// namespaces never collide in a shared store.
    pub fn store_key(&self, key: &str) -> Vec<u8> {
        let name = self.namespace.as_bytes();
        let mut store_key = Vec::with_capacity(4 + name.len() + key.len());
        store_key.extend_from_slice(&(name.len() as u32).to_be_bytes());
        store_key.extend_from_slice(name);
        store_key.extend_from_slice(key.as_bytes());
        store_key
    }

    /// Greatest record timestamp merged into this namespace so far.
    pub fn last_updated_time(&self) -> i64 {
        self.last_updated_time.load(Ordering::Acquire)
    }

    /// Raises the high-water mark to `ts` if it is newer.
    ///
    /// Returns true when the mark moved. Never lowers the mark, even when
    /// called concurrently.
    pub fn advance_last_updated_time(&self, ts: i64) -> bool {
        self.last_updated_time.fetch_max(ts, Ordering::AcqRel) < ts
    }
}

// == Namespace Registry ==
/// Registered namespaces, keyed by name.
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    namespaces: RwLock<HashMap<String, Arc<ExtractionNamespace>>>,
}

impl NamespaceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a namespace, replacing any with the same name.
    pub fn register(&self, namespace: ExtractionNamespace) -> Arc<ExtractionNamespace> {
        let namespace = Arc::new(namespace);
        let mut namespaces = self
            .namespaces
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        namespaces.insert(namespace.namespace().to_string(), Arc::clone(&namespace));
        namespace
    }

    /// Looks up a namespace by name.
    pub fn get(&self, name: &str) -> Option<Arc<ExtractionNamespace>> {
        self.namespaces
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    /// Registered namespace names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .namespaces
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
