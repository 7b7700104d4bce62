//! Per-client memoization of read calls.
//!
//! Only successful results are stored, so a failed call never poisons its key
//! and the next identical call runs the operation again. Identical calls that
//! overlap run the operation once and all receive its outcome. Entries are not
//! tied to token state.

use crate::settings::CacheSettings;
use log::trace;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

/// Memoization table for the blocking client.
pub struct Memoizer<K, V> {
    cache: moka::sync::Cache<K, V>,
}

impl<K, V> Memoizer<K, V>
where
    K: Hash + Eq + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(settings: &CacheSettings) -> Self {
        let mut builder = moka::sync::Cache::builder();
        if let Some(max_entries) = settings.max_entries {
            builder = builder.max_capacity(max_entries);
        }
        if let Some(ttl) = settings.time_to_live() {
            builder = builder.time_to_live(ttl);
        }

        Memoizer {
            cache: builder.build(),
        }
    }

    /// Return the stored value for `key`, or run `op` and store its success.
    pub fn memoize<E>(&self, key: K, op: impl FnOnce() -> Result<V, E>) -> Result<V, E>
    where
        E: Clone + Send + Sync + 'static,
    {
        if let Some(value) = self.cache.get(&key) {
            trace!("Memo hit for {:?}", key);
            return Ok(value);
        }

        self.cache.try_get_with(key, op).map_err(unshare)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }
}

/// Memoization table for the async client.
pub struct AsyncMemoizer<K, V> {
    cache: moka::future::Cache<K, V>,
}

impl<K, V> AsyncMemoizer<K, V>
where
    K: Hash + Eq + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(settings: &CacheSettings) -> Self {
        let mut builder = moka::future::Cache::builder();
        if let Some(max_entries) = settings.max_entries {
            builder = builder.max_capacity(max_entries);
        }
        if let Some(ttl) = settings.time_to_live() {
            builder = builder.time_to_live(ttl);
        }

        AsyncMemoizer {
            cache: builder.build(),
        }
    }

    /// Async [`Memoizer::memoize`]. Only the first of several overlapping calls
    /// for `key` awaits `op`, the others wait for its outcome.
    pub async fn memoize<E, F, Fut>(&self, key: K, op: F) -> Result<V, E>
    where
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.cache.get(&key).await {
            trace!("Memo hit for {:?}", key);
            return Ok(value);
        }

        self.cache.try_get_with(key, op()).await.map_err(unshare)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }
}

// moka hands the same error to every waiter
fn unshare<E: Clone>(err: Arc<E>) -> E {
    Arc::try_unwrap(err).unwrap_or_else(|shared| (*shared).clone())
}
