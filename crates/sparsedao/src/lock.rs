//! In-process pessimistic locks keyed by entity id.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sparsedao_core::cache::CacheServiceProvider;
use sparsedao_core::storage::Entity;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::dao::LockAttainer;

/// Default time to wait for a held lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("Timed out after {millis}ms waiting for the lock on {key}")]
    Timeout { key: String, millis: u64 },
}

/// Keyed locks for entities of one type, held within this process.
///
/// Callers take locks with [`LocalLockAttainer::lock`] before a pessimistic
/// write; the engine releases them through [`LockAttainer::unlock_and_evict`],
/// which also drops the entity from the read-through cache, if one is set.
pub struct LocalLockAttainer<E: Entity> {
    held: Mutex<HashSet<String>>,
    released: Notify,
    wait: Duration,
    cache: Option<Arc<dyn CacheServiceProvider<String, E>>>,
}

impl<E: Entity> Default for LocalLockAttainer<E> {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}

impl<E: Entity> LocalLockAttainer<E> {
    pub fn new(wait: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Notify::new(),
            wait,
            cache: None,
        }
    }

    /// Evicts released entities from `cache`, keyed by their id.
    pub fn with_cache(mut self, cache: Arc<dyn CacheServiceProvider<String, E>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Takes the entity's lock, waiting up to the configured wait time.
    pub async fn lock(&self, entity: &E) -> Result<(), LockError> {
        let key = entity.id().to_string();
        let deadline = Instant::now() + self.wait;

        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.held.lock().await.insert(key.clone()) {
                tracing::debug!(key = %key, "Lock acquired");
                return Ok(());
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(LockError::Timeout {
                    key,
                    millis: u64::try_from(self.wait.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }
    }

    /// Takes the lock only if it is free.
    pub async fn try_lock(&self, entity: &E) -> bool {
        self.held.lock().await.insert(entity.id().to_string())
    }

    pub async fn is_locked(&self, entity: &E) -> bool {
        self.held.lock().await.contains(&entity.id().to_string())
    }
}

#[async_trait]
impl<E: Entity> LockAttainer<E> for LocalLockAttainer<E> {
    async fn unlock_and_evict(&self, entity: &E) {
        let key = entity.id().to_string();

        if self.held.lock().await.remove(&key) {
            self.released.notify_waiters();
            tracing::debug!(key = %key, "Lock released");
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.expire(&key).await {
                tracing::warn!(key = %key, error = %e, "Failed to evict released entity");
            }
        }
    }
}
