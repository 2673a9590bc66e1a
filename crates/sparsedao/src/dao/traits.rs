use async_trait::async_trait;
use sparsedao_core::row::{Deletion, Mutation, Row};
use sparsedao_core::storage::{Entity, LockType, Result, StoreResult, Table};

use crate::executor::ExecutorService;

/// Maps entities to physical rows and back.
///
/// Conversions receive the execution service because an entity may span
/// several tables (or need lookups) to be assembled.
#[async_trait]
pub trait RowConverter<E: Entity>: Send + Sync {
    /// Mutations writing `entity`, paired with their target table.
    ///
    /// A converter for a versioned schema puts the entity's current version
    /// (if any) into the version column; the engine bumps it.
    async fn to_rows(
        &self,
        entity: &E,
        executor: &ExecutorService,
        pessimistic: bool,
    ) -> Result<Vec<(String, Mutation)>>;

    /// Deletions removing `entity`, paired with their target table.
    async fn to_deletable_rows(
        &self,
        entity: &E,
        executor: &ExecutorService,
        pessimistic: bool,
    ) -> Result<Vec<(String, Deletion)>>;

    /// Builds an entity from its main-table row. `Ok(None)` skips the row.
    async fn from_row(&self, row: &Row, executor: &ExecutorService) -> Result<Option<E>>;
}

/// Sole authority for pessimistic locks on entities.
#[async_trait]
pub trait LockAttainer<E: Entity>: Send + Sync {
    /// Releases the entity's lock and evicts it from any read-through cache.
    ///
    /// Must be idempotent and must not fail.
    async fn unlock_and_evict(&self, entity: &E);
}

/// Reconciles pending mutations with the stored rows before they are written.
#[async_trait]
pub trait MergeService: Send + Sync {
    async fn merge(
        &self,
        table: &dyn Table,
        mutations: &mut [Mutation],
        lock_type: LockType,
    ) -> StoreResult<()>;
}
