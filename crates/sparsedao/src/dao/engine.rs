use std::sync::Arc;

use sparsedao_core::row::Column;
use sparsedao_core::schema::SchemaInfoProvider;
use sparsedao_core::storage::Entity;

use crate::config::DaoConfig;
use crate::executor::ExecutorService;

use super::builder::EntityDaoBuilder;
use super::traits::{LockAttainer, MergeService, RowConverter};

/// Typed CRUD and queries for one entity type.
///
/// All collaborators are fixed at construction through
/// [`EntityDao::builder`]; the engine holds no mutable state of its own.
/// Cloning shares the collaborators.
pub struct EntityDao<E: Entity> {
    pub(super) schema: Arc<dyn SchemaInfoProvider<E::Id>>,
    pub(super) converter: Arc<dyn RowConverter<E>>,
    pub(super) executor: ExecutorService,
    pub(super) lock_attainer: Option<Arc<dyn LockAttainer<E>>>,
    pub(super) merge_service: Option<Arc<dyn MergeService>>,
    pub(super) config: DaoConfig,
}

impl<E: Entity> Clone for EntityDao<E> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            converter: Arc::clone(&self.converter),
            executor: self.executor.clone(),
            lock_attainer: self.lock_attainer.clone(),
            merge_service: self.merge_service.clone(),
            config: self.config,
        }
    }
}

impl<E: Entity> EntityDao<E> {
    pub fn builder() -> EntityDaoBuilder<E> {
        EntityDaoBuilder::new()
    }

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    pub fn executor(&self) -> &ExecutorService {
        &self.executor
    }

    pub(super) fn table(&self) -> &str {
        self.schema.main_table_name()
    }

    /// Column guarding compare-and-swap writes, when they apply.
    ///
    /// Writes are guarded only in optimistic mode on a versioned schema.
    pub(super) fn cas_column(&self) -> Option<&Column> {
        if self.config.lock_type.is_pessimistic() {
            return None;
        }
        self.schema.version_column()
    }

    /// Merge service to run for this write, if merging applies.
    pub(super) fn active_merge_service(&self, requested: bool) -> Option<Arc<dyn MergeService>> {
        if requested && self.config.merge_enabled {
            self.merge_service.clone()
        } else {
            None
        }
    }

    /// Releases every entity once. Runs after each write, whatever its outcome.
    pub(super) async fn release_locks(&self, entities: &[E]) {
        let Some(attainer) = &self.lock_attainer else {
            return;
        };
        for entity in entities {
            attainer.unlock_and_evict(entity).await;
        }
        tracing::debug!(
            table = %self.table(),
            count = entities.len(),
            "Released entity locks"
        );
    }
}
