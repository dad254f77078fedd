//! Background Tasks Module
//!
//! Contains background tasks that run during server operation.
//!
//! # Tasks
//! - Refresh feed ingest: applies queued records through `merge`

mod ingest;

pub use ingest::{spawn_ingest_task, FeedRecord};
