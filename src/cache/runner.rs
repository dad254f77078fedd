//! Cache Action Runner
//!
//! Wires one reader and one merger over the same store handle, schema
//! registry, and metrics sink.

use std::sync::Arc;

use crate::cache::decode::DecodeSpec;
use crate::cache::locks::KeyLocks;
use crate::cache::merger::{CacheMerger, MergeOutcome};
use crate::cache::metrics::MetricsSink;
use crate::cache::namespace::ExtractionNamespace;
use crate::cache::reader::{CacheReader, LookupResult};
use crate::cache::store::StoreHandle;
use crate::schema::{SchemaRegistry, SchemaType};

/// Entry point for cache actions: lookups and merges.
#[derive(Debug)]
pub struct CacheActionRunner {
    store: StoreHandle,
    schemas: Arc<SchemaRegistry>,
    reader: CacheReader,
    merger: CacheMerger,
}

impl CacheActionRunner {
    /// Creates a runner with `lock_stripes` merge locks.
    pub fn new(
        store: StoreHandle,
        schemas: Arc<SchemaRegistry>,
        metrics: Arc<dyn MetricsSink>,
        lock_stripes: usize,
    ) -> Self {
        let reader = CacheReader::new(store.clone(), Arc::clone(&schemas), Arc::clone(&metrics));
        let merger = CacheMerger::new(
            store.clone(),
            Arc::clone(&schemas),
            metrics,
            KeyLocks::new(lock_stripes),
        );
        Self {
            store,
            schemas,
            reader,
            merger,
        }
    }

    /// See [`CacheReader::get`].
    pub fn get_cache_value(
        &self,
        namespace: &ExtractionNamespace,
        key: &str,
        value_column: Option<&str>,
        decode_spec: Option<&DecodeSpec>,
    ) -> LookupResult {
        self.reader.get(namespace, key, value_column, decode_spec)
    }

    /// See [`CacheMerger::merge`].
    pub fn update_cache(
        &self,
        namespace: &ExtractionNamespace,
        key: &str,
        value: &[u8],
    ) -> MergeOutcome {
        self.merger.merge(namespace, key, value)
    }

    /// Encoding family of the decoder serving `namespace`.
    pub fn schema_type(&self, namespace: &str) -> Option<SchemaType> {
        self.schemas.schema_type_for(namespace)
    }

    /// Handle of the shared store.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}
