//! Redis cache implementation.
//!
//! Values are stored as JSON. Every key written through a cache is also added
//! to a tracking set named after its prefix, so `clear` can drop exactly the
//! keys it owns without SCAN.
//!
//! # Non-Atomicity Safety
//!
//! Writes and evictions issue several Redis commands. A crash between them
//! leaves at worst a stale member in the tracking set, which `clear` deletes
//! as a no-op. Values themselves are never left half-written.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

use sparsedao_core::cache::{
    deserialize_value, serialize_value, CacheKey, CacheKeyPrefixStrategy, CacheServiceProvider,
    CacheStats, Expiry, Result,
};

use super::error::map_redis_error;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    evictions: AtomicU64,
}

/// Redis cache backend using connection manager for pooling.
pub struct RedisCache<K, V> {
    conn: redis::aio::ConnectionManager,
    prefix: CacheKeyPrefixStrategy,
    counters: Arc<Counters>,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> RedisCache<K, V> {
    /// Creates a new Redis cache connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str, prefix: CacheKeyPrefixStrategy) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        tracing::info!(prefix = %prefix.prefix(), "Redis cache connected");
        Ok(Self {
            conn,
            prefix,
            counters: Arc::new(Counters::default()),
            _types: PhantomData,
        })
    }
}

impl<K, V> RedisCache<K, V>
where
    K: CacheKey,
    V: Serialize + DeserializeOwned,
{
    fn backend_key(&self, key: &K) -> String {
        self.prefix.prefixed_key(&key.to_string())
    }

    async fn write(&self, key: String, value: &V, expiry: Option<&Expiry>) -> Result<()> {
        let mut conn = self.conn.clone();
        let bytes = serialize_value(value)?;

        match expiry {
            Some(expiry) => {
                let seconds = expiry.ttl_from(Utc::now()).as_secs().max(1);
                conn.set_ex::<_, _, ()>(&key, bytes, seconds)
                    .await
                    .map_err(map_redis_error)?;
            }
            None => {
                conn.set::<_, _, ()>(&key, bytes)
                    .await
                    .map_err(map_redis_error)?;
            }
        }

        conn.sadd::<_, _, ()>(self.prefix.tracking_key(), &key)
            .await
            .map_err(map_redis_error)?;
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<V>> {
        let mut conn = self.conn.clone();
        let bytes: Option<Vec<u8>> = conn.get(key).await.map_err(map_redis_error)?;

        let counter = if bytes.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);

        bytes
            .map(|bytes| deserialize_value(&bytes))
            .transpose()
            .map_err(Into::into)
    }
}

#[async_trait]
impl<K, V> CacheServiceProvider<K, V> for RedisCache<K, V>
where
    K: CacheKey,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn put(&self, key: K, value: V, expiry: Option<Expiry>) -> Result<()> {
        self.write(self.backend_key(&key), &value, expiry.as_ref())
            .await
    }

    async fn put_all(&self, entries: Vec<(K, V)>, expiry: Option<Expiry>) -> Result<()> {
        for (key, value) in &entries {
            self.write(self.backend_key(key), value, expiry.as_ref())
                .await?;
        }
        Ok(())
    }

    async fn expire(&self, key: &K) -> Result<Option<V>> {
        let key = self.backend_key(key);
        let previous = self.read(&key).await?;

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key).await.map_err(map_redis_error)?;
        conn.srem::<_, _, ()>(self.prefix.tracking_key(), &key)
            .await
            .map_err(map_redis_error)?;

        if previous.is_some() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(previous)
    }

    async fn get(&self, key: &K) -> Result<Option<V>> {
        self.read(&self.backend_key(key)).await
    }

    async fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.read(&self.backend_key(key)).await? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    async fn contains_key(&self, key: &K) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(self.backend_key(key))
            .await
            .map_err(map_redis_error)
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let tracking_key = self.prefix.tracking_key();

        let tracked: Vec<String> = conn
            .smembers(&tracking_key)
            .await
            .map_err(map_redis_error)?;
        if !tracked.is_empty() {
            conn.del::<_, ()>(&tracked).await.map_err(map_redis_error)?;
        }
        conn.del::<_, ()>(&tracking_key)
            .await
            .map_err(map_redis_error)?;

        tracing::debug!(keys = tracked.len(), "Redis cache cleared");
        Ok(())
    }

    fn prefix_strategy(&self) -> &CacheKeyPrefixStrategy {
        &self.prefix
    }

    async fn stats(&self) -> Result<CacheStats> {
        let mut conn = self.conn.clone();
        let entries: usize = conn
            .scard(self.prefix.tracking_key())
            .await
            .map_err(map_redis_error)?;

        Ok(CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries,
        })
    }
}
