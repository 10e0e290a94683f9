//! Cache Module
//!
//! Keyed TTL caching for expensive async fetches, with single-flight
//! deduplication of concurrent calls for the same key.

mod entry;
mod fetch;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use fetch::FetchCache;
pub use stats::CacheStats;
