//! In-memory cache implementation with LRU eviction.
//!
//! Provides a thread-safe in-memory cache with TTL support using tokio
//! synchronization primitives and LRU eviction policy.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use tokio::sync::RwLock;

use sparsedao_core::cache::{
    CacheKey, CacheKeyPrefixStrategy, CacheServiceProvider, CacheStats, Expiry, Result,
};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    /// Returns true if this entry has expired.
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    evictions: AtomicU64,
}

/// In-memory cache implementation with LRU eviction.
///
/// Thread-safe cache using `Arc<RwLock<LruCache>>` for concurrent access.
/// Supports TTL with lazy expiration (expired entries are dropped when
/// looked up). Uses LRU eviction to limit memory usage when `max_entries`
/// is reached.
#[derive(Debug)]
pub struct MemoryCache<K, V> {
    store: Arc<RwLock<LruCache<String, CacheEntry<V>>>>,
    prefix: CacheKeyPrefixStrategy,
    /// TTL applied to puts without an explicit expiry.
    default_ttl: Option<Duration>,
    counters: Arc<Counters>,
    _key: PhantomData<fn() -> K>,
}

impl<K, V> Clone for MemoryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            prefix: self.prefix.clone(),
            default_ttl: self.default_ttl,
            counters: Arc::clone(&self.counters),
            _key: PhantomData,
        }
    }
}

impl<K, V> MemoryCache<K, V> {
    /// Creates a new in-memory cache with LRU eviction.
    ///
    /// A `max_entries` of zero is treated as one.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            prefix: CacheKeyPrefixStrategy::NoPrefix,
            default_ttl: None,
            counters: Arc::new(Counters::default()),
            _key: PhantomData,
        }
    }

    pub fn with_prefix(mut self, prefix: CacheKeyPrefixStrategy) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    fn ttl(&self, expiry: Option<Expiry>) -> Option<Duration> {
        match expiry {
            Some(expiry) => Some(expiry.ttl_from(Utc::now())),
            None => self.default_ttl,
        }
    }
}

impl<K: CacheKey, V> MemoryCache<K, V> {
    fn backend_key(&self, key: &K) -> String {
        self.prefix.prefixed_key(&key.to_string())
    }
}

impl<K, V: Clone> MemoryCache<K, V> {
    fn insert(
        &self,
        store: &mut LruCache<String, CacheEntry<V>>,
        key: String,
        entry: CacheEntry<V>,
    ) {
        if let Some((evicted, _)) = store.push(key.clone(), entry) {
            if evicted != key {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
    }

    /// Looks up a live entry, dropping it if it has expired.
    fn lookup(&self, store: &mut LruCache<String, CacheEntry<V>>, key: &str) -> Option<V> {
        let expired = match store.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            store.pop(key);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }
}

#[async_trait]
impl<K, V> CacheServiceProvider<K, V> for MemoryCache<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    async fn put(&self, key: K, value: V, expiry: Option<Expiry>) -> Result<()> {
        let entry = CacheEntry::new(value, self.ttl(expiry));
        let mut store = self.store.write().await;
        self.insert(&mut store, self.backend_key(&key), entry);
        Ok(())
    }

    async fn put_all(&self, entries: Vec<(K, V)>, expiry: Option<Expiry>) -> Result<()> {
        let ttl = self.ttl(expiry);
        let mut store = self.store.write().await;
        for (key, value) in entries {
            self.insert(&mut store, self.backend_key(&key), CacheEntry::new(value, ttl));
        }
        Ok(())
    }

    async fn expire(&self, key: &K) -> Result<Option<V>> {
        let mut store = self.store.write().await;
        let removed = store.pop(&self.backend_key(key));
        if removed.is_some() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value))
    }

    async fn get(&self, key: &K) -> Result<Option<V>> {
        let mut store = self.store.write().await;
        Ok(self.lookup(&mut store, &self.backend_key(key)))
    }

    async fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>> {
        let mut store = self.store.write().await;
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.lookup(&mut store, &self.backend_key(key))
                    .map(|value| (key.clone(), value))
            })
            .collect())
    }

    async fn contains_key(&self, key: &K) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store
            .peek(&self.backend_key(key))
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> Result<()> {
        let mut store = self.store.write().await;
        store.clear();
        Ok(())
    }

    fn prefix_strategy(&self) -> &CacheKeyPrefixStrategy {
        &self.prefix
    }

    async fn stats(&self) -> Result<CacheStats> {
        let store = self.store.read().await;
        Ok(CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: store.len(),
        })
    }
}
