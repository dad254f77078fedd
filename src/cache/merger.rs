//! Cache Merger Module
//!
//! Folds incoming records into the store under a "newer timestamp wins"
//! rule and advances the namespace high-water mark.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use crate::cache::locks::KeyLocks;
use crate::cache::metrics::{Metric, MetricsSink};
use crate::cache::namespace::ExtractionNamespace;
use crate::cache::store::{KeyValueStore, StoreHandle};
use crate::error::Result;
use crate::schema::{read_timestamp, SchemaRegistry};

// == Merge Outcome ==
/// What a merge did. Informational only; merges never fail the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The record was written
    Written,
    /// The stored record is at least as new; nothing was written
    Stale,
    /// Namespace disabled or store not open
    Skipped,
    /// A decode or store failure was caught and reported
    Failed,
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeOutcome::Written => "written",
            MergeOutcome::Stale => "stale",
            MergeOutcome::Skipped => "skipped",
            MergeOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

// == Cache Merger ==
/// Applies refresh-feed records to the shared store, one key stripe at a time.
pub struct CacheMerger {
    store: StoreHandle,
    schemas: Arc<SchemaRegistry>,
    metrics: Arc<dyn MetricsSink>,
    locks: KeyLocks,
}

impl CacheMerger {
    /// Creates a merger over `store`, serializing same-key merges with `locks`.
    pub fn new(
        store: StoreHandle,
        schemas: Arc<SchemaRegistry>,
        metrics: Arc<dyn MetricsSink>,
        locks: KeyLocks,
    ) -> Self {
        Self {
            store,
            schemas,
            metrics,
            locks,
        }
    }

    // == Merge ==
    /// Merges `value` into the store under `key`.
    ///
    /// The record is written only when no entry exists or its timestamp is
    /// strictly greater than the stored one. The namespace high-water mark
    /// is raised to the new timestamp whenever both records decode. Errors
    /// are logged and counted, never returned.
    pub fn merge(&self, namespace: &ExtractionNamespace, key: &str, value: &[u8]) -> MergeOutcome {
        if !namespace.is_cache_enabled() {
            return MergeOutcome::Skipped;
        }

        let _guard = self.locks.lock(namespace.namespace(), key);

        let Some(store) = self.store.current() else {
            debug!(
                namespace = namespace.namespace(),
                key, "store not open, dropping update"
            );
            return MergeOutcome::Skipped;
        };

        match self.apply(store.as_ref(), namespace, key, value) {
            Ok(outcome) => {
                self.metrics.emit(Metric::UpdateCacheSuccess, 1);
                outcome
            }
            Err(e) => {
                error!(
                    namespace = namespace.namespace(),
                    key,
                    error = %e,
                    "Caught exception while updating cache"
                );
                self.metrics.emit(Metric::UpdateCacheFailure, 1);
                MergeOutcome::Failed
            }
        }
    }

    fn apply(
        &self,
        store: &dyn KeyValueStore,
        namespace: &ExtractionNamespace,
        key: &str,
        value: &[u8],
    ) -> Result<MergeOutcome> {
        let decoder = self.schemas.decoder_for(namespace.namespace())?;
        let ts_column = namespace.ts_column();

        let incoming = decoder.parse(value)?;
        let new_ts = read_timestamp(incoming.as_ref(), ts_column)?;

        let store_key = namespace.store_key(key);
        let newer = match store.get(&store_key)? {
            Some(raw) => {
                let existing = decoder.parse(&raw)?;
                let existing_ts = read_timestamp(existing.as_ref(), ts_column)?;
                new_ts > existing_ts
            }
            None => true,
        };

        let outcome = if newer {
            store.put(&store_key, value)?;
            MergeOutcome::Written
        } else {
            debug!(key, new_ts, "stored record is as new or newer, keeping it");
            MergeOutcome::Stale
        };

        namespace.advance_last_updated_time(new_ts);
        Ok(outcome)
    }
}

impl fmt::Debug for CacheMerger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheMerger")
            .field("store", &self.store)
            .field("stripes", &self.locks.stripe_count())
            .finish()
    }
}
