use std::future::Future;
use std::sync::Arc;

use sparsedao_core::storage::{StoreError, StoreResult, Table, TableProvider};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::ExecutorConfig;

/// Runs units of work against named tables.
///
/// At most `worker_count` operations hold a table handle at any time; the
/// rest wait for a permit. Cloning is cheap and shares the permit pool.
#[derive(Clone)]
pub struct ExecutorService {
    tables: Arc<dyn TableProvider>,
    permits: Arc<Semaphore>,
    config: ExecutorConfig,
}

impl ExecutorService {
    pub fn new(config: ExecutorConfig, tables: Arc<dyn TableProvider>) -> Self {
        tracing::info!(
            workers = config.worker_count,
            timeout_ms = config.operation_timeout_ms,
            "Execution service created"
        );

        Self {
            tables,
            permits: Arc::new(Semaphore::new(config.worker_count)),
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Permits not currently held by running operations.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Rejects every operation submitted from now on with [`StoreError::Closed`].
    pub fn close(&self) {
        self.permits.close();
    }

    /// Runs `work` against `table` and waits for its result.
    pub async fn execute<T, F, Fut>(&self, table: &str, work: F) -> StoreResult<T>
    where
        F: FnOnce(Arc<dyn Table>) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| StoreError::Closed)?;
        let handle = self.tables.table(table).await?;

        match tokio::time::timeout(self.config.operation_timeout(), work(handle)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    table = %table,
                    timeout_ms = self.config.operation_timeout_ms,
                    "Store operation timed out"
                );
                Err(StoreError::Timeout {
                    table: table.to_string(),
                    millis: self.config.operation_timeout_ms,
                })
            }
        }
    }

    /// Spawns `work` against `table`; the result is collected through the handle.
    pub fn execute_async<T, F, Fut>(&self, table: impl Into<String>, work: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn Table>) -> Fut + Send + 'static,
        Fut: Future<Output = StoreResult<T>> + Send + 'static,
    {
        let executor = self.clone();
        let table = table.into();
        TaskHandle {
            handle: tokio::spawn(async move { executor.execute(&table, work).await }),
        }
    }
}

/// Pending result of [`ExecutorService::execute_async`].
pub struct TaskHandle<T> {
    handle: JoinHandle<StoreResult<T>>,
}

impl<T> TaskHandle<T> {
    /// Waits for the task. A panicked or cancelled task yields
    /// [`StoreError::TaskFailed`].
    pub async fn join(self) -> StoreResult<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(StoreError::TaskFailed(e.to_string())),
        }
    }
}

/// Joins a batch of handles, keeping their order.
pub async fn join_all<T>(handles: Vec<TaskHandle<T>>) -> Vec<StoreResult<T>> {
    futures_util::future::join_all(handles.into_iter().map(TaskHandle::join)).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::storage::memory::MemoryStore;

    fn executor(workers: usize, timeout_ms: u64) -> ExecutorService {
        let store = MemoryStore::with_tables(["people"]);
        ExecutorService::new(
            ExecutorConfig::new(workers, timeout_ms).unwrap(),
            Arc::new(store),
        )
    }

    #[tokio::test]
    async fn test_execute_returns_work_result() {
        let executor = executor(2, 1_000);

        let name = executor
            .execute("people", |table| async move { Ok(table.name().to_string()) })
            .await
            .unwrap();

        assert_eq!(name, "people");
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let executor = executor(2, 1_000);

        let result = executor.execute("orders", |_| async { Ok(()) }).await;

        assert_eq!(result, Err(StoreError::TableNotFound("orders".to_string())));
    }

    #[tokio::test]
    async fn test_timeout() {
        let executor = executor(2, 10);

        let result = executor
            .execute("people", |_| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await;

        assert_eq!(
            result,
            Err(StoreError::Timeout {
                table: "people".to_string(),
                millis: 10
            })
        );
    }

    #[tokio::test]
    async fn test_closed_service_rejects_work() {
        let executor = executor(2, 1_000);
        executor.close();

        let result = executor.execute("people", |_| async { Ok(()) }).await;

        assert_eq!(result, Err(StoreError::Closed));
    }

    #[tokio::test]
    async fn test_execute_async_and_join_all() {
        let executor = executor(4, 1_000);

        let handles = (0..5)
            .map(|n| executor.execute_async("people", move |_| async move { Ok(n * 2) }))
            .collect();

        let results = join_all(handles).await;

        assert_eq!(results, vec![Ok(0), Ok(2), Ok(4), Ok(6), Ok(8)]);
    }

    #[tokio::test]
    async fn test_permits_bound_concurrency() {
        let executor = executor(2, 1_000);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles = (0..8)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                executor.execute_async("people", move |_| async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        let results = join_all(handles).await;

        assert!(results.iter().all(Result::is_ok));
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(executor.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_panicked_task_is_task_failed() {
        let executor = executor(2, 1_000);

        let handle: TaskHandle<()> = executor.execute_async("people", |_| async {
            let fail = true;
            if fail {
                panic!("boom");
            }
            Ok(())
        });

        assert!(matches!(handle.join().await, Err(StoreError::TaskFailed(_))));
    }
}
