//! Request and Response models for the lookup cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FeedItem, FeedRequest, LookupQuery};
pub use responses::{
    ErrorResponse, FeedResponse, HealthResponse, LookupResponse, MergeResponse,
    NamespaceResponse, NamespacesResponse, StatsResponse,
};
