//! Cache Reader Module
//!
//! Point lookups against the store: fetch, decode, and pick a field.

use std::sync::Arc;

use tracing::{debug, error};

use crate::cache::decode::{decode_conditional, DecodeSpec};
use crate::cache::metrics::{Metric, MetricsSink};
use crate::cache::namespace::ExtractionNamespace;
use crate::cache::store::{KeyValueStore, StoreHandle};
use crate::error::{CacheError, Result};
use crate::schema::SchemaRegistry;

// == Lookup Result ==
/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The selected field's value
    Found(Vec<u8>),
    /// Key absent, or the selected field holds no value
    Empty,
    /// Store not open, or the lookup failed
    Unavailable,
}

impl LookupResult {
    /// Found value as UTF-8, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LookupResult::Found(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

// == Cache Reader ==
/// Serves lookups from the shared store. Holds no lock.
#[derive(Clone)]
pub struct CacheReader {
    store: StoreHandle,
    schemas: Arc<SchemaRegistry>,
    metrics: Arc<dyn MetricsSink>,
}

impl CacheReader {
    /// Creates a reader over `store`, decoding with `schemas`.
    pub fn new(
        store: StoreHandle,
        schemas: Arc<SchemaRegistry>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            store,
            schemas,
            metrics,
        }
    }

    // == Get ==
    /// Looks up `key` in `namespace`.
    ///
    /// Without a decode spec the value of `value_column` is returned. With
    /// one, the column it selects is returned instead. Failures are logged,
    /// counted as `GetCacheValueFailure`, and reported as `Unavailable`; a
    /// closed store is `Unavailable` without being counted.
    pub fn get(
        &self,
        namespace: &ExtractionNamespace,
        key: &str,
        value_column: Option<&str>,
        decode_spec: Option<&DecodeSpec>,
    ) -> LookupResult {
        let Some(store) = self.store.current() else {
            return LookupResult::Unavailable;
        };

        match self.read(store.as_ref(), namespace, key, value_column, decode_spec) {
            Ok(Some(value)) => LookupResult::Found(value.into_bytes()),
            Ok(None) => LookupResult::Empty,
            Err(e) => {
                error!(
                    namespace = namespace.namespace(),
                    key,
                    error = %e,
                    "Caught exception while getting cache value"
                );
                self.metrics.emit(Metric::GetCacheValueFailure, 1);
                LookupResult::Unavailable
            }
        }
    }

    fn read(
        &self,
        store: &dyn KeyValueStore,
        namespace: &ExtractionNamespace,
        key: &str,
        value_column: Option<&str>,
        decode_spec: Option<&DecodeSpec>,
    ) -> Result<Option<String>> {
        let Some(raw) = store.get(&namespace.store_key(key))? else {
            return Ok(None);
        };

        let decoder = self.schemas.decoder_for(namespace.namespace())?;
        let record = decoder.parse(&raw)?;

        if let Some(spec) = decode_spec {
            return Ok(decode_conditional(spec, record.as_ref())?);
        }

        let column = value_column.ok_or(CacheError::MissingValueColumn)?;
        let value = record.read_field(column)?;
        debug!(field = column, value = ?value, "extracted field from record");
        Ok(value)
    }
}

impl std::fmt::Debug for CacheReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheReader")
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::metrics::CacheMetrics;
    use crate::cache::store::MemoryStore;
    use crate::error::StoreError;
    use crate::schema::{JsonRecordDecoder, RecordSchema};

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &[u8]) -> std::result::Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Io("disk gone".to_string()))
        }

        fn put(&self, _key: &[u8], _value: &[u8]) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io("disk gone".to_string()))
        }
    }

    struct Fixture {
        reader: CacheReader,
        store: Arc<MemoryStore>,
        metrics: Arc<CacheMetrics>,
        namespace: ExtractionNamespace,
        decoder: JsonRecordDecoder,
    }

    fn fixture() -> Fixture {
        let decoder = JsonRecordDecoder::new(RecordSchema::new(
            "ad_v1",
            ["id", "status", "title", "alt_title", "ts"],
        ));
        let schemas = Arc::new(SchemaRegistry::new());
        schemas.register("ad", Arc::new(decoder.clone()));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(CacheMetrics::new());
        let reader = CacheReader::new(
            StoreHandle::open_with(store.clone()),
            schemas,
            metrics.clone(),
        );
        Fixture {
            reader,
            store,
            metrics,
            namespace: ExtractionNamespace::new("ad", "ts", "ad_v1", true),
            decoder,
        }
    }

    #[test]
    fn test_get_found() {
        let f = fixture();
        let bytes = f.decoder.encode(&[("title", "shoes"), ("ts", "1")]).unwrap();
        f.store.put(&f.namespace.store_key("k1"), &bytes).unwrap();

        let result = f.reader.get(&f.namespace, "k1", Some("title"), None);
        assert_eq!(result, LookupResult::Found(b"shoes".to_vec()));
        assert_eq!(result.as_str(), Some("shoes"));
    }

    #[test]
    fn test_get_missing_key_is_empty() {
        let f = fixture();
        let result = f.reader.get(&f.namespace, "nope", Some("title"), None);
        assert_eq!(result, LookupResult::Empty);
        assert_eq!(f.metrics.count(Metric::GetCacheValueFailure), 0);
    }

    #[test]
    fn test_get_does_not_see_other_namespace_records() {
        let f = fixture();
        let bytes = f.decoder.encode(&[("title", "shoes"), ("ts", "1")]).unwrap();
        f.store.put(&f.namespace.store_key("k1"), &bytes).unwrap();
        let campaign = ExtractionNamespace::new("campaign", "ts", "ad_v1", true);

        let result = f.reader.get(&campaign, "k1", Some("title"), None);
        assert_eq!(result, LookupResult::Empty);
    }

    #[test]
    fn test_get_null_field_is_empty() {
        let f = fixture();
        let bytes = f.decoder.encode(&[("ts", "1")]).unwrap();
        f.store.put(&f.namespace.store_key("k1"), &bytes).unwrap();

        let result = f.reader.get(&f.namespace, "k1", Some("title"), None);
        assert_eq!(result, LookupResult::Empty);
    }

    #[test]
    fn test_get_closed_store_is_unavailable_without_metric() {
        let schemas = Arc::new(SchemaRegistry::new());
        let metrics = Arc::new(CacheMetrics::new());
        let reader = CacheReader::new(StoreHandle::closed(), schemas, metrics.clone());
        let namespace = ExtractionNamespace::new("ad", "ts", "ad_v1", true);

        let result = reader.get(&namespace, "k1", Some("title"), None);
        assert_eq!(result, LookupResult::Unavailable);
        assert_eq!(metrics.count(Metric::GetCacheValueFailure), 0);
    }

    #[test]
    fn test_get_malformed_record_is_unavailable() {
        let f = fixture();
        f.store.put(&f.namespace.store_key("k1"), b"\xff\xfe garbage").unwrap();

        let result = f.reader.get(&f.namespace, "k1", Some("title"), None);
        assert_eq!(result, LookupResult::Unavailable);
        assert_eq!(f.metrics.count(Metric::GetCacheValueFailure), 1);
    }

    #[test]
    fn test_get_unknown_field_is_unavailable() {
        let f = fixture();
        let bytes = f.decoder.encode(&[("title", "shoes")]).unwrap();
        f.store.put(&f.namespace.store_key("k1"), &bytes).unwrap();

        let result = f.reader.get(&f.namespace, "k1", Some("budget"), None);
        assert_eq!(result, LookupResult::Unavailable);
        assert_eq!(f.metrics.count(Metric::GetCacheValueFailure), 1);
    }

    #[test]
    fn test_get_without_value_column_is_unavailable() {
        let f = fixture();
        let bytes = f.decoder.encode(&[("title", "shoes")]).unwrap();
        f.store.put(&f.namespace.store_key("k1"), &bytes).unwrap();

        let result = f.reader.get(&f.namespace, "k1", None, None);
        assert_eq!(result, LookupResult::Unavailable);
        assert_eq!(f.metrics.count(Metric::GetCacheValueFailure), 1);
    }

    #[test]
    fn test_get_store_failure_is_unavailable() {
        let schemas = Arc::new(SchemaRegistry::new());
        let metrics = Arc::new(CacheMetrics::new());
        let reader = CacheReader::new(
            StoreHandle::open_with(Arc::new(FailingStore)),
            schemas,
            metrics.clone(),
        );
        let namespace = ExtractionNamespace::new("ad", "ts", "ad_v1", true);

        let result = reader.get(&namespace, "k1", Some("title"), None);
        assert_eq!(result, LookupResult::Unavailable);
        assert_eq!(metrics.count(Metric::GetCacheValueFailure), 1);
    }

    #[test]
    fn test_get_with_decode_spec() {
        let f = fixture();
        let bytes = f
            .decoder
            .encode(&[("status", "ON"), ("title", "shoes"), ("alt_title", "boots")])
            .unwrap();
        f.store.put(&f.namespace.store_key("k1"), &bytes).unwrap();

        let matched = DecodeSpec::new("status", "ON", "title", "alt_title");
        let unmatched = DecodeSpec::new("status", "OFF", "title", "alt_title");

        assert_eq!(
            f.reader.get(&f.namespace, "k1", None, Some(&matched)).as_str(),
            Some("shoes")
        );
        assert_eq!(
            f.reader
                .get(&f.namespace, "k1", Some("title"), Some(&unmatched))
                .as_str(),
            Some("boots")
        );
    }

    #[test]
    fn test_get_with_decode_spec_empty_selection() {
        let f = fixture();
        let bytes = f
            .decoder
            .encode(&[("status", "ON"), ("title", ""), ("alt_title", "boots")])
            .unwrap();
        f.store.put(&f.namespace.store_key("k1"), &bytes).unwrap();

        let spec = DecodeSpec::new("status", "ON", "title", "alt_title");
        assert_eq!(
            f.reader.get(&f.namespace, "k1", None, Some(&spec)),
            LookupResult::Empty
        );
    }
}
