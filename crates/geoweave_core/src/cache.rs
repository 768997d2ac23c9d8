//! # Memoizing Cache
//!
//! Every generator follows the same shape: check the cache, compute, store.
//! [`MemoCache`] is that shape, written once and shared by the dungeon
//! generator, the stencil engine and the tile-map loader.
//!
//! ## Guarantees
//!
//! - **Pure optimization**: a miss always recomputes. A failing
//!   [`CacheStore`] is logged and treated as a miss (reads) or skipped
//!   (writes); it never surfaces as an error.
//! - **Single flight**: concurrent requests for the same key share one
//!   computation. Waiters park on a `tokio::sync::OnceCell` that lives in
//!   the in-flight map only while the value is being produced.
//! - **No invalidation**: generated values are pure functions of their key.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::OnceCell;

use crate::error::CacheError;

/// Boxed future returned by [`CacheStore`] methods.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + Send + 'a>>;

/// An external key/value cache (in-process map, Redis, browser storage...).
///
/// Both operations may be asynchronous and may fail; failures are never
/// fatal to the caller.
pub trait CacheStore<K, V>: Send + Sync {
    /// Looks up a value.
    fn get<'a>(&'a self, key: &'a K) -> CacheFuture<'a, Option<V>>;

    /// Stores a value.
    fn set<'a>(&'a self, key: &'a K, value: V) -> CacheFuture<'a, ()>;
}

/// Process-local store backed by a `HashMap`.
pub struct InMemoryStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryStore<K, V> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get<'a>(&'a self, key: &'a K) -> CacheFuture<'a, Option<V>> {
        let hit = self.entries.read().get(key).cloned();
        Box::pin(std::future::ready(Ok(hit)))
    }

    fn set<'a>(&'a self, key: &'a K, value: V) -> CacheFuture<'a, ()> {
        self.entries.write().insert(key.clone(), value);
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Store that never retains anything; only single-flight deduplication
/// remains.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl<K, V> CacheStore<K, V> for NullStore
where
    K: Sync,
    V: Send + 'static,
{
    fn get<'a>(&'a self, _key: &'a K) -> CacheFuture<'a, Option<V>> {
        Box::pin(std::future::ready(Ok(None)))
    }

    fn set<'a>(&'a self, _key: &'a K, _value: V) -> CacheFuture<'a, ()> {
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Single-flight memoization in front of a [`CacheStore`].
pub struct MemoCache<K, V> {
    name: &'static str,
    store: Arc<dyn CacheStore<K, V>>,
    inflight: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache backed by a fresh [`InMemoryStore`].
    ///
    /// `name` labels log events.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_store(name, Arc::new(InMemoryStore::new()))
    }

    /// Creates a cache in front of an external store.
    #[must_use]
    pub fn with_store(name: &'static str, store: Arc<dyn CacheStore<K, V>>) -> Self {
        Self {
            name,
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// The label used in log events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the cached value for `key`, computing it with `init` on a miss.
    ///
    /// # Errors
    ///
    /// Returns whatever `init` returns. Store failures are not errors.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut inflight = self.inflight.lock();
            Arc::clone(inflight.entry(key.clone()).or_default())
        };

        let name = self.name;
        let store = &self.store;
        let key_ref = &key;
        let result = cell
            .get_or_try_init(|| async move {
                match store.get(key_ref).await {
                    Ok(Some(hit)) => {
                        tracing::trace!(cache = name, "cache hit");
                        return Ok(hit);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(cache = name, error = %err, "cache read failed, recomputing");
                    }
                }
                let value = init().await?;
                if let Err(err) = store.set(key_ref, value.clone()).await {
                    tracing::warn!(cache = name, error = %err, "cache write failed, value not stored");
                }
                Ok(value)
            })
            .await
            .cloned();

        let mut inflight = self.inflight.lock();
        if inflight
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            inflight.remove(&key);
        }
        result
    }

    /// Number of keys currently being computed.
    #[must_use]
    pub fn inflight_len(&self) -> usize {
        self.inflight.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenStore;

    impl CacheStore<String, u32> for BrokenStore {
        fn get<'a>(&'a self, _key: &'a String) -> CacheFuture<'a, Option<u32>> {
            Box::pin(std::future::ready(Err(CacheError::Unavailable("down".into()))))
        }

        fn set<'a>(&'a self, _key: &'a String, _value: u32) -> CacheFuture<'a, ()> {
            Box::pin(std::future::ready(Err(CacheError::Unavailable("down".into()))))
        }
    }

    #[tokio::test]
    async fn test_memoizes_values() {
        let cache: MemoCache<String, u32> = MemoCache::new("test");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_init("k".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.inflight_len(), 0);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let cache: MemoCache<String, u32> = MemoCache::with_store("test", Arc::new(NullStore));
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, CacheError>(42)
        };
        let (a, b) = tokio::join!(
            cache.get_or_try_init("k".to_string(), compute),
            cache.get_or_try_init("k".to_string(), compute),
        );
        assert_eq!(a.unwrap(), 42);
        assert_eq!(b.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_broken_store_is_a_miss() {
        let cache: MemoCache<String, u32> = MemoCache::with_store("test", Arc::new(BrokenStore));
        let value = cache
            .get_or_try_init("k".to_string(), || async { Ok::<_, CacheError>(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: MemoCache<String, u32> = MemoCache::new("test");
        let failed = cache
            .get_or_try_init("k".to_string(), || async { Err::<u32, _>("boom") })
            .await;
        assert_eq!(failed, Err("boom"));

        let value = cache
            .get_or_try_init("k".to_string(), || async { Ok::<_, &str>(5) })
            .await
            .unwrap();
        assert_eq!(value, 5);
    }
}
