use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::filter::Scan;
use crate::row::{Column, Deletion, Mutation, Row};

use super::StoreResult;

/// A domain record persisted by the engine.
///
/// The engine only reads identity, version and validity; it never mutates
/// entity contents.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Display + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    /// Last version this snapshot was read at. `None` for never-stored entities.
    fn version(&self) -> Option<i64> {
        None
    }

    fn is_valid(&self) -> bool {
        true
    }
}

/// Concurrency control applied by write operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    /// Compare-and-swap on the version column.
    #[default]
    Optimistic,
    /// Unguarded batch writes under externally held locks.
    Pessimistic,
}

impl LockType {
    pub fn is_pessimistic(self) -> bool {
        matches!(self, LockType::Pessimistic)
    }
}

impl std::str::FromStr for LockType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(LockType::Optimistic),
            "pessimistic" => Ok(LockType::Pessimistic),
            other => Err(format!("unknown lock type: {other}")),
        }
    }
}

/// Handle to one table of a sparse column-family store.
#[async_trait]
pub trait Table: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, row: &[u8]) -> StoreResult<Option<Row>>;

    async fn exists(&self, row: &[u8]) -> StoreResult<bool>;

    /// Returns at most `limit` rows accepted by `scan`, in row-key order.
    async fn scan(&self, scan: &Scan, limit: usize) -> StoreResult<Vec<Row>>;

    /// Applies all mutations without any guard.
    async fn put(&self, mutations: Vec<Mutation>) -> StoreResult<()>;

    /// Applies `mutation` only if `column` of `row` holds `expected`
    /// (`None` meaning the column must be absent). Returns whether it applied.
    async fn check_and_put(
        &self,
        row: &[u8],
        column: &Column,
        expected: Option<&[u8]>,
        mutation: Mutation,
    ) -> StoreResult<bool>;

    async fn delete(&self, deletions: Vec<Deletion>) -> StoreResult<()>;

    /// Guarded counterpart of [`Table::delete`] for a single row.
    async fn check_and_delete(
        &self,
        row: &[u8],
        column: &Column,
        expected: Option<&[u8]>,
        deletion: Deletion,
    ) -> StoreResult<bool>;
}

/// Resolves table names to handles.
#[async_trait]
pub trait TableProvider: Send + Sync {
    async fn table(&self, name: &str) -> StoreResult<Arc<dyn Table>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_type_parse() {
        assert_eq!("optimistic".parse::<LockType>(), Ok(LockType::Optimistic));
        assert_eq!(" Pessimistic ".parse::<LockType>(), Ok(LockType::Pessimistic));
        assert!("exclusive".parse::<LockType>().is_err());
    }

    #[test]
    fn test_lock_type_default_is_optimistic() {
        assert_eq!(LockType::default(), LockType::Optimistic);
        assert!(!LockType::default().is_pessimistic());
    }
}
