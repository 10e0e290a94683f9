//! Keyed Cache - a TTL cache wrapper for expensive async fetches
//!
//! Wraps a caller-supplied asynchronous "fetch fresh value" function into a
//! key-addressed, time-expiring cache. Cached values are served while valid,
//! refetched on expiry, and concurrent calls for the same key collapse into
//! a single in-flight fetch.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use keyed_cache::FetchCache;
//!
//! #[derive(Clone)]
//! struct Params {
//!     user_id: String,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = FetchCache::new(
//!     |params: &Params| format!("user:{}:labels:newsletter", params.user_id),
//!     |params: Params| async move {
//!         // The expensive lookup being memoized
//!         Ok::<_, String>(format!("label-for-{}", params.user_id))
//!     },
//!     Duration::from_secs(60 * 60 * 24 * 7),
//! );
//!
//! let label = cache.call(Params { user_id: "42".into() }).await.unwrap();
//! # assert_eq!(label, "label-for-42");
//! # }
//! ```

pub mod cache;

pub use cache::{CacheEntry, CacheStats, FetchCache};
