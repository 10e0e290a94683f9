//! Fetch Cache Module
//!
//! The keyed TTL cache wrapper: turns an async "fetch fresh value" function
//! into a key-addressed, time-expiring cache that collapses concurrent
//! fetches for the same key into a single in-flight call.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::cache::{CacheEntry, CacheStats};

// == Cache State ==
/// Mutable state guarded by a single mutex: the entry store, the in-flight
/// registry, and the stats counters.
///
/// The mutex is never held across an await point. Lookups and the
/// check-then-register step are short critical sections, so calls for
/// unrelated keys never wait on each other's fetches.
struct CacheState<V, E> {
    /// Key-addressed entries, at most one per key
    entries: HashMap<String, CacheEntry<V>>,
    /// Pending fetches by key, present only while a fetch is outstanding
    in_flight: HashMap<String, broadcast::Sender<Result<V, E>>>,
    /// Performance statistics
    stats: CacheStats,
}

impl<V, E> CacheState<V, E> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            stats: CacheStats::new(),
        }
    }
}

// == In-Flight Guard ==
/// Clears a key's in-flight registration if the leading call is dropped
/// before it settles (timeout, task abort). Waiters on the broadcast channel
/// then see it close and retry, so the key is never stuck "in-flight".
struct InFlightGuard<'a, V, E> {
    state: &'a Mutex<CacheState<V, E>>,
    key: &'a str,
    armed: bool,
}

impl<V, E> Drop for InFlightGuard<'_, V, E> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = lock_state(self.state);
            state.in_flight.remove(self.key);
        }
    }
}

/// Locks the state mutex, recovering from poisoning.
///
/// Nothing panics while the maps are mid-update; a poisoned lock can only
/// mean a caller's `Clone` impl panicked, leaving the state coherent.
fn lock_state<V, E>(state: &Mutex<CacheState<V, E>>) -> MutexGuard<'_, CacheState<V, E>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Fetch Cache ==
/// Keyed TTL cache around an async fetch function.
///
/// Configured once with a key-derivation function, a fresh-value producer,
/// and a TTL. [`call`](FetchCache::call) then serves cached values while
/// they are valid, refetches on expiry, and collapses concurrent calls for
/// the same key into one producer invocation whose outcome every caller
/// shares.
///
/// `generate_key` must be pure and deterministic: the same key for
/// logically-equivalent arguments, distinct keys for distinct ones. The
/// cache has no way to detect a collision and will silently conflate
/// entries if that contract is broken.
///
/// A `ttl` of [`Duration::ZERO`] disables caching entirely: every call
/// invokes the producer (concurrent calls for one key still share a single
/// invocation). Negative durations cannot be expressed by [`Duration`].
///
/// The wrapper raises no errors of its own. Whatever error the producer
/// returns is delivered unwrapped to every caller sharing that fetch, and
/// is never cached: the next call for the key starts a fresh attempt.
pub struct FetchCache<A, K, F, V, E> {
    /// Derives the cache key from the call arguments
    generate_key: K,
    /// The expensive, authoritative fetch being memoized
    fetch_fresh_value: F,
    /// How long a stored value stays valid
    ttl: Duration,
    /// Entry store, in-flight registry, and counters
    state: Mutex<CacheState<V, E>>,
    _args: PhantomData<fn(A)>,
}

impl<A, K, F, Fut, V, E> FetchCache<A, K, F, V, E>
where
    K: Fn(&A) -> String,
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<V, E>>,
    V: Clone,
    E: Clone,
{
    // == Constructor ==
    /// Creates a new FetchCache.
    ///
    /// # Arguments
    /// * `generate_key` - Pure function mapping call arguments to a cache key
    /// * `fetch_fresh_value` - Async producer of the authoritative value
    /// * `ttl` - How long a fetched value remains valid
    pub fn new(generate_key: K, fetch_fresh_value: F, ttl: Duration) -> Self {
        Self {
            generate_key,
            fetch_fresh_value,
            ttl,
            state: Mutex::new(CacheState::new()),
            _args: PhantomData,
        }
    }

    // == Call ==
    /// Returns the value for `args`, from cache when possible.
    ///
    /// In order of precedence:
    /// 1. A valid (unexpired) entry for the derived key is returned
    ///    immediately; this path never suspends.
    /// 2. If a fetch for the key is already in flight, the call attaches to
    ///    it and shares its eventual outcome rather than fetching again.
    /// 3. Otherwise this call fetches, stores the value on success, and
    ///    broadcasts the outcome to any callers that attached meanwhile.
    pub async fn call(&self, args: A) -> Result<V, E> {
        let key = (self.generate_key)(&args);

        loop {
            let mut rx = {
                let mut state = lock_state(&self.state);

                match state.entries.get(&key) {
                    Some(entry) if !entry.is_expired() => {
                        trace!(key = %key, "cache hit");
                        let value = entry.value.clone();
                        state.stats.record_hit();
                        return Ok(value);
                    }
                    Some(_) => {
                        // Stale entry, drop it before refetching
                        state.entries.remove(&key);
                        let count = state.entries.len();
                        state.stats.set_total_entries(count);
                    }
                    None => {}
                }

                match state.in_flight.get(&key) {
                    Some(tx) => {
                        debug!(key = %key, "joining in-flight fetch");
                        let rx = tx.subscribe();
                        state.stats.record_coalesced();
                        rx
                    }
                    None => {
                        // No valid entry and nothing in flight: this call
                        // becomes the fetch initiator for the key.
                        let (tx, _rx) = broadcast::channel(1);
                        state.in_flight.insert(key.clone(), tx);
                        state.stats.record_miss();
                        break;
                    }
                }
            };

            match rx.recv().await {
                Ok(outcome) => return outcome,
                // The initiator was dropped before settling; its
                // registration is already cleared, so retry from the top.
                Err(_) => continue,
            }
        }

        debug!(key = %key, "cache miss, fetching fresh value");

        let mut guard = InFlightGuard {
            state: &self.state,
            key: &key,
            armed: true,
        };
        let result = (self.fetch_fresh_value)(args).await;
        guard.armed = false;

        let tx = {
            let mut state = lock_state(&self.state);
            match &result {
                Ok(value) if !self.ttl.is_zero() => {
                    trace!(key = %key, "storing fresh value");
                    state
                        .entries
                        .insert(key.clone(), CacheEntry::new(value.clone(), self.ttl));
                    let count = state.entries.len();
                    state.stats.set_total_entries(count);
                }
                Ok(_) => {}
                Err(_) => {
                    debug!(key = %key, "fetch failed, nothing cached");
                }
            }
            state.in_flight.remove(&key)
        };

        // Every waiter subscribed before the registration was removed above;
        // a send error just means nobody was waiting.
        if let Some(tx) = tx {
            let _ = tx.send(result.clone());
        }

        result
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = lock_state(&self.state);
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        lock_state(&self.state).entries.len()
    }

    // == Is Empty ==
    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        lock_state(&self.state).entries.is_empty()
    }
}
