//! Keeps a free-text index in step with persisted data.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sparsedao_core::search::{
    DocumentAdapter, FreeTextPersistentDao, IdentifierQuery, Result, SearchError, SearchWriter,
};
use tokio::task::JoinHandle;

/// Default time each index operation may take before it is abandoned.
pub const DEFAULT_INDEX_WAIT: Duration = Duration::from_secs(10);

/// Index DAO fanning out one task per datum.
///
/// Operations that time out or whose task dies are logged and skipped.
/// Operations that fail are collected into one [`SearchError::Incomplete`].
pub struct IndexingDao<T> {
    writer: Arc<dyn SearchWriter>,
    adapter: Arc<dyn DocumentAdapter<T>>,
    identifier: Arc<dyn IdentifierQuery<T>>,
    wait_time: Duration,
}

impl<T> IndexingDao<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(
        writer: Arc<dyn SearchWriter>,
        adapter: Arc<dyn DocumentAdapter<T>>,
        identifier: Arc<dyn IdentifierQuery<T>>,
    ) -> Self {
        Self {
            writer,
            adapter,
            identifier,
            wait_time: DEFAULT_INDEX_WAIT,
        }
    }

    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    fn spawn_add(&self, datum: T) -> JoinHandle<Result<()>> {
        let writer = Arc::clone(&self.writer);
        let adapter = Arc::clone(&self.adapter);
        tokio::spawn(async move {
            let document = adapter.to_document(&datum)?;
            writer.add(document).await
        })
    }

    fn spawn_delete(&self, datum: &T) -> JoinHandle<Result<()>> {
        let writer = Arc::clone(&self.writer);
        let query = self.identifier.query_for(datum);
        tokio::spawn(async move { writer.delete_by_query(&query).await })
    }

    /// Waits for every task, each bounded by the wait time.
    async fn join(&self, operation: &str, tasks: Vec<JoinHandle<Result<()>>>) -> Result<()> {
        let mut failures = Vec::new();
        for mut task in tasks {
            match tokio::time::timeout(self.wait_time, &mut task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => failures.push(e.to_string()),
                Ok(Err(e)) => {
                    tracing::warn!(operation, error = %e, "Index task failed");
                }
                Err(_) => {
                    task.abort();
                    tracing::warn!(
                        operation,
                        wait_ms = u64::try_from(self.wait_time.as_millis()).unwrap_or(u64::MAX),
                        "Index task timed out"
                    );
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(operation, failed = failures.len(), "Index operations failed");
            Err(SearchError::Incomplete(failures))
        }
    }
}

#[async_trait]
impl<T> FreeTextPersistentDao<T> for IndexingDao<T>
where
    T: Send + Sync + 'static,
{
    async fn save(&self, data: Vec<T>) -> Result<()> {
        let tasks = data.into_iter().map(|datum| self.spawn_add(datum)).collect();
        self.join("save", tasks).await
    }

    async fn update(&self, data: Vec<T>) -> Result<()> {
        let deletes = data.iter().map(|datum| self.spawn_delete(datum)).collect();
        self.join("update", deletes).await?;
        self.save(data).await
    }

    async fn delete(&self, data: Vec<T>) -> Result<()> {
        let tasks = data.iter().map(|datum| self.spawn_delete(datum)).collect();
        self.join("delete", tasks).await
    }
}
