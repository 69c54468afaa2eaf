// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregator;
pub mod api;
pub mod config;
pub mod metrics;
pub mod stats;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::types::{Article, FeedFetch, FeedQuirk, RawFeedEntry, SourceDescriptor};
pub use crate::aggregator::{aggregate, AggregateOptions};
pub use crate::api::{create_router, AppState};
