use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use sparsedao_core::storage::{StoreError, StoreResult, Table, TableProvider};

use super::MemoryTable;

/// In-memory storage backend for tests and demos.
///
/// Tables must be created before use; resolving an unknown table fails with
/// [`StoreError::TableNotFound`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Arc<MemoryTable>>>>,
}

impl MemoryStore {
    /// Creates an empty store without tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the given tables.
    pub fn with_tables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                (name.clone(), Arc::new(MemoryTable::new(name)))
            })
            .collect();

        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Creates a table if it does not exist yet.
    pub async fn create_table(&self, name: &str) -> Arc<MemoryTable> {
        let mut tables = self.tables.write().await;
        Arc::clone(
            tables
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryTable::new(name))),
        )
    }

    /// Typed handle to a table, for inspection.
    pub async fn memory_table(&self, name: &str) -> Option<Arc<MemoryTable>> {
        self.tables.read().await.get(name).cloned()
    }

    /// Writes applied across all tables.
    pub async fn write_count(&self) -> usize {
        self.tables
            .read()
            .await
            .values()
            .map(|table| table.write_count())
            .sum()
    }
}

#[async_trait]
impl TableProvider for MemoryStore {
    async fn table(&self, name: &str) -> StoreResult<Arc<dyn Table>> {
        let tables = self.tables.read().await;
        match tables.get(name) {
            Some(table) => Ok(Arc::clone(table) as Arc<dyn Table>),
            None => Err(StoreError::TableNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparsedao_core::row::Mutation;

    #[tokio::test]
    async fn test_unknown_table() {
        let store = MemoryStore::new();
        assert_eq!(
            store.table("people").await.err(),
            Some(StoreError::TableNotFound("people".to_string()))
        );
    }

    #[tokio::test]
    async fn test_create_table_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.create_table("people").await;
        let second = store.create_table("people").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(store.table("people").await.is_ok());
    }

    #[tokio::test]
    async fn test_write_count_spans_tables() {
        let store = MemoryStore::with_tables(["people", "orders"]);

        let people = store.table("people").await.unwrap();
        let orders = store.table("orders").await.unwrap();
        people
            .put(vec![Mutation::new("a").with_put("info", "name", "Ada")])
            .await
            .unwrap();
        orders
            .put(vec![
                Mutation::new("o1").with_put("info", "total", "10"),
                Mutation::new("o2").with_put("info", "total", "20"),
            ])
            .await
            .unwrap();

        assert_eq!(store.write_count().await, 3);
        assert_eq!(
            store.memory_table("orders").await.unwrap().len().await,
            2
        );
    }
}
