//! Refresh Feed Ingest Task
//!
//! Background task draining a bounded channel of fetched records into the
//! cache through `merge`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{CacheActionRunner, ExtractionNamespace, MergeOutcome};

/// One record delivered by the refresh feed.
#[derive(Debug, Clone)]
pub struct FeedRecord {
    pub namespace: Arc<ExtractionNamespace>,
    pub key: String,
    pub value: Vec<u8>,
}

/// Spawns a task that merges every record received on `feed`.
///
/// Merges are blocking, so each one runs on the blocking pool. The task ends
/// once every sender has been dropped and the channel is drained.
///
/// # Example
/// ```ignore
/// let (tx, rx) = tokio::sync::mpsc::channel(1024);
/// let ingest_handle = spawn_ingest_task(runner.clone(), rx);
/// // Later, during shutdown:
/// drop(tx);
/// ingest_handle.await?;
/// ```
pub fn spawn_ingest_task(
    runner: Arc<CacheActionRunner>,
    mut feed: mpsc::Receiver<FeedRecord>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting refresh feed ingest task");

        let mut applied: u64 = 0;
        while let Some(record) = feed.recv().await {
            let runner = Arc::clone(&runner);
            let outcome = tokio::task::spawn_blocking(move || {
                runner.update_cache(&record.namespace, &record.key, &record.value)
            })
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "feed merge job panicked");
                MergeOutcome::Failed
            });

            applied += 1;
            debug!(outcome = %outcome, "feed record applied");
        }

        info!("Refresh feed closed after {} records", applied);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{
        CacheMetrics, KeyValueStore, LookupResult, MemoryStore, Metric, StoreHandle,
    };
    use crate::error::StoreError;
    use crate::schema::{JsonRecordDecoder, RecordSchema, SchemaRegistry};

    /// Memory store that panics when asked to write a value containing "boom".
    #[derive(Default)]
    struct PanickyStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for PanickyStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
            if value.windows(4).any(|w| w == b"boom") {
                panic!("store crashed on write");
            }
            self.inner.put(key, value)
        }
    }

    fn setup() -> (
        Arc<CacheActionRunner>,
        Arc<ExtractionNamespace>,
        JsonRecordDecoder,
        Arc<CacheMetrics>,
    ) {
        let decoder = JsonRecordDecoder::new(RecordSchema::new("ad_v1", ["val", "ts"]));
        let schemas = Arc::new(SchemaRegistry::new());
        schemas.register("ad", Arc::new(decoder.clone()));
        let metrics = Arc::new(CacheMetrics::new());
        let runner = Arc::new(CacheActionRunner::new(
            StoreHandle::open_with(Arc::new(MemoryStore::new())),
            schemas,
            metrics.clone(),
            4,
        ));
        let namespace = Arc::new(ExtractionNamespace::new("ad", "ts", "ad_v1", true));
        (runner, namespace, decoder, metrics)
    }

    #[tokio::test]
    async fn test_ingest_applies_records_in_order() {
        let (runner, ns, decoder, metrics) = setup();
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_ingest_task(runner.clone(), rx);

        for (ts, val) in [("100", "a"), ("50", "b"), ("200", "c")] {
            tx.send(FeedRecord {
                namespace: ns.clone(),
                key: "k1".to_string(),
                value: decoder.encode(&[("ts", ts), ("val", val)]).unwrap(),
            })
            .await
            .unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        assert_eq!(
            runner.get_cache_value(&ns, "k1", Some("val"), None),
            LookupResult::Found(b"c".to_vec())
        );
        assert_eq!(ns.last_updated_time(), 200);
        assert_eq!(metrics.count(Metric::UpdateCacheSuccess), 3);
    }

    #[tokio::test]
    async fn test_ingest_survives_bad_records() {
        let (runner, ns, decoder, metrics) = setup();
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_ingest_task(runner.clone(), rx);

        tx.send(FeedRecord {
            namespace: ns.clone(),
            key: "k1".to_string(),
            value: b"garbage".to_vec(),
        })
        .await
        .unwrap();
        tx.send(FeedRecord {
            namespace: ns.clone(),
            key: "k1".to_string(),
            value: decoder.encode(&[("ts", "10"), ("val", "ok")]).unwrap(),
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(metrics.count(Metric::UpdateCacheFailure), 1);
        assert_eq!(
            runner.get_cache_value(&ns, "k1", Some("val"), None).as_str(),
            Some("ok")
        );
    }

    #[tokio::test]
    async fn test_ingest_survives_panicking_merge() {
        let decoder = JsonRecordDecoder::new(RecordSchema::new("ad_v1", ["val", "ts"]));
        let schemas = Arc::new(SchemaRegistry::new());
        schemas.register("ad", Arc::new(decoder.clone()));
        let runner = Arc::new(CacheActionRunner::new(
            StoreHandle::open_with(Arc::new(PanickyStore::default())),
            schemas,
            Arc::new(CacheMetrics::new()),
            1,
        ));
        let ns = Arc::new(ExtractionNamespace::new("ad", "ts", "ad_v1", true));

        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_ingest_task(runner.clone(), rx);

        for (ts, val) in [("1", "boom"), ("2", "ok")] {
            tx.send(FeedRecord {
                namespace: ns.clone(),
                key: "k1".to_string(),
                value: decoder.encode(&[("ts", ts), ("val", val)]).unwrap(),
            })
            .await
            .unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        assert_eq!(
            runner.get_cache_value(&ns, "k1", Some("val"), None).as_str(),
            Some("ok")
        );
        assert_eq!(ns.last_updated_time(), 2);
    }

    #[tokio::test]
    async fn test_ingest_task_ends_when_feed_closes() {
        let (runner, _, _, _) = setup();
        let (tx, rx) = mpsc::channel::<FeedRecord>(1);
        let handle = spawn_ingest_task(runner, rx);

        drop(tx);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("ingest task should stop")
            .unwrap();
    }
}
