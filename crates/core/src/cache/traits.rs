use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use async_trait::async_trait;

use super::{CacheKeyPrefixStrategy, CacheStats, Expiry, Result};

/// Bounds for logical cache keys. Backends see `prefix + key.to_string()`.
pub trait CacheKey: Display + Eq + Hash + Clone + Send + Sync + 'static {}

impl<T: Display + Eq + Hash + Clone + Send + Sync + 'static> CacheKey for T {}

/// Key/value cache with optional expiry.
#[async_trait]
pub trait CacheServiceProvider<K, V>: Send + Sync
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    /// Stores a value. `None` keeps it until evicted.
    async fn put(&self, key: K, value: V, expiry: Option<Expiry>) -> Result<()>;

    /// Stores several values sharing one expiry.
    async fn put_all(&self, entries: Vec<(K, V)>, expiry: Option<Expiry>) -> Result<()>;

    /// Evicts a key, returning the value it held.
    async fn expire(&self, key: &K) -> Result<Option<V>>;

    async fn get(&self, key: &K) -> Result<Option<V>>;

    /// Looks up several keys; missing keys are absent from the map.
    async fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>>;

    async fn contains_key(&self, key: &K) -> Result<bool>;

    /// Removes every entry written through this provider.
    async fn clear(&self) -> Result<()>;

    fn prefix_strategy(&self) -> &CacheKeyPrefixStrategy;

    async fn stats(&self) -> Result<CacheStats>;
}
