//! Lookup Cache - A read/merge cache over an embedded key-value store
//!
//! Serves point lookups of schema-encoded records, with optional conditional
//! field selection, and merges refresh-feed updates so that a stored record
//! is never replaced by an older one.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheActionRunner, DecodeSpec, LookupResult, MergeOutcome};
pub use config::Config;
pub use tasks::spawn_ingest_task;
