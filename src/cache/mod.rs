//! Cache Module
//!
//! Read and merge actions over a shared key-value store: point lookups with
//! optional conditional decode, and timestamp-ordered merges that never
//! replace a record with an older one.

mod decode;
mod locks;
mod merger;
mod metrics;
mod namespace;
mod reader;
mod runner;
mod store;


// Re-export public types
pub use decode::{decode_conditional, DecodeSpec};
pub use locks::{KeyLocks, DEFAULT_LOCK_STRIPES};
pub use merger::{CacheMerger, MergeOutcome};
pub use metrics::{CacheMetrics, Metric, MetricsSink, MetricsSnapshot};
pub use namespace::{ExtractionNamespace, NamespaceConfig, NamespaceRegistry};
pub use reader::{CacheReader, LookupResult};
pub use runner::CacheActionRunner;
pub use store::{KeyValueStore, MemoryStore, StoreHandle};
