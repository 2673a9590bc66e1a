//! Write path.
//!
//! Every write call runs `validate -> verify existence -> convert -> write
//! per table group -> release locks`. The existence check is all or nothing:
//! one violating entity aborts the call before any mutation is issued.
//! Guarded (optimistic) writes are not transactional; rows that were applied
//! before a conflict stay applied.

use std::sync::Arc;

use sparsedao_core::row::{decode_version, encode_version, Column, Deletion, Mutation};
use sparsedao_core::storage::{
    dao_error_kind, ConflictReport, DaoError, Entity, Result, StoreResult, WriteFailure,
};

use crate::executor::join_all;

use super::engine::EntityDao;
use super::traits::MergeService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Save,
    Update,
    Delete,
}

impl WriteKind {
    /// Whether every entity must already be stored.
    fn expects_existing(self) -> bool {
        !matches!(self, WriteKind::Save)
    }

    fn precondition_message(self) -> &'static str {
        match self {
            WriteKind::Save => {
                "Some of the entities are already saved, so did not proceed with any of them"
            }
            WriteKind::Update | WriteKind::Delete => {
                "Some of the entities are not saved, so did not proceed with any of them"
            }
        }
    }
}

impl<E: Entity> EntityDao<E> {
    /// Stores new entities. Fails if any of them is already stored.
    pub async fn save(&self, entities: &[E]) -> Result<()> {
        self.run_write(entities, WriteKind::Save).await
    }

    /// Rewrites stored entities. Fails if any of them is not stored.
    ///
    /// Runs the merge service first when merging is enabled.
    pub async fn update(&self, entities: &[E]) -> Result<()> {
        self.run_write(entities, WriteKind::Update).await
    }

    /// Removes stored entities. Fails if any of them is not stored.
    ///
    /// On a versioned schema in optimistic mode each row is only deleted if
    /// its version still matches the entity's.
    pub async fn delete(&self, entities: &[E]) -> Result<()> {
        self.run_write(entities, WriteKind::Delete).await
    }

    async fn run_write(&self, entities: &[E], kind: WriteKind) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }

        let result = match kind {
            WriteKind::Save | WriteKind::Update => self.try_put(entities, kind).await,
            WriteKind::Delete => self.try_delete(entities).await,
        };
        self.release_locks(entities).await;

        match &result {
            Ok(()) => tracing::info!(
                table = %self.table(),
                operation = ?kind,
                count = entities.len(),
                "Write completed"
            ),
            Err(e) => tracing::warn!(
                table = %self.table(),
                operation = ?kind,
                kind = dao_error_kind(e),
                error = %e,
                "Write failed"
            ),
        }
        result
    }

    async fn try_put(&self, entities: &[E], kind: WriteKind) -> Result<()> {
        validate(entities)?;
        self.verify_existence(entities, kind).await?;

        let pessimistic = self.config.lock_type.is_pessimistic();
        let mut pending = Vec::new();
        for entity in entities {
            pending.extend(
                self.converter
                    .to_rows(entity, &self.executor, pessimistic)
                    .await?,
            );
        }

        let merge = self.active_merge_service(kind == WriteKind::Update);
        for (table, mutations) in group_by_table(pending) {
            let mutations = match &merge {
                Some(service) => {
                    self.merge(&table, Arc::clone(service), mutations)
                        .await?
                }
                None => mutations,
            };

            match self.cas_column() {
                Some(column) => self
                    .put_guarded(&table, column, mutations)
                    .await?
                    .into_result()?,
                None => self.put_batch(&table, mutations).await?,
            }
        }
        Ok(())
    }

    async fn try_delete(&self, entities: &[E]) -> Result<()> {
        validate(entities)?;
        self.verify_existence(entities, WriteKind::Delete).await?;

        let pessimistic = self.config.lock_type.is_pessimistic();
        let mut pending = Vec::new();
        for entity in entities {
            let version = entity.version();
            let deletions = self
                .converter
                .to_deletable_rows(entity, &self.executor, pessimistic)
                .await?;
            pending.extend(
                deletions
                    .into_iter()
                    .map(|(table, deletion)| (table, (deletion, version))),
            );
        }

        for (table, deletions) in group_by_table(pending) {
            match self.cas_column() {
                Some(column) => self
                    .delete_guarded(&table, column, deletions)
                    .await
                    .into_result()?,
                None => {
                    let deletions = deletions.into_iter().map(|(deletion, _)| deletion).collect();
                    self.delete_batch(&table, deletions).await?;
                }
            }
        }
        Ok(())
    }

    /// Checks every entity's row concurrently and joins all checks.
    async fn verify_existence(&self, entities: &[E], kind: WriteKind) -> Result<()> {
        let handles = entities
            .iter()
            .map(|entity| {
                let key = self.schema.row_key_from_id(&entity.id());
                self.executor
                    .execute_async(self.table(), move |table| async move {
                        table.exists(&key).await
                    })
            })
            .collect();

        let expected = kind.expects_existing();
        let mut violated = false;
        for exists in join_all(handles).await {
            violated |= exists? != expected;
        }

        if violated {
            return Err(DaoError::Precondition(
                kind.precondition_message().to_string(),
            ));
        }
        Ok(())
    }

    async fn merge(
        &self,
        table: &str,
        service: Arc<dyn MergeService>,
        mut mutations: Vec<Mutation>,
    ) -> Result<Vec<Mutation>> {
        let lock_type = self.config.lock_type;
        let merged = self
            .executor
            .execute(table, move |handle| async move {
                service
                    .merge(handle.as_ref(), &mut mutations, lock_type)
                    .await?;
                Ok(mutations)
            })
            .await?;
        Ok(merged)
    }

    /// Stamps `previous + 1` into each mutation and applies it guarded on
    /// the version column still holding `previous`.
    async fn put_guarded(
        &self,
        table: &str,
        column: &Column,
        mutations: Vec<Mutation>,
    ) -> Result<ConflictReport> {
        let mut stamped = Vec::with_capacity(mutations.len());
        for mut mutation in mutations {
            let previous = mutation
                .get(&column.family, &column.qualifier)
                .map(<[u8]>::to_vec);
            let next = match &previous {
                Some(bytes) => {
                    let version = decode_version(bytes).ok_or_else(|| {
                        DaoError::InvalidData(format!(
                            "Version of row {} is not a valid version",
                            row_id(mutation.row())
                        ))
                    })?;
                    version.checked_add(1).ok_or_else(|| {
                        DaoError::InvalidData(format!(
                            "Version of row {} cannot be incremented",
                            row_id(mutation.row())
                        ))
                    })?
                }
                None => 1,
            };
            mutation.put(&column.family, &column.qualifier, encode_version(next));
            tracing::trace!(
                table = %table,
                row = %row_id(mutation.row()),
                version = next,
                "Stamped version"
            );
            stamped.push((previous, mutation));
        }

        let mut row_ids = Vec::with_capacity(stamped.len());
        let mut handles = Vec::with_capacity(stamped.len());
        for (previous, mutation) in stamped {
            let row = mutation.row().to_vec();
            let column = column.clone();
            row_ids.push(row_id(&row));
            handles.push(
                self.executor
                    .execute_async(table, move |handle| async move {
                        handle
                            .check_and_put(&row, &column, previous.as_deref(), mutation)
                            .await
                    }),
            );
        }

        Ok(collect_failures(table, row_ids, join_all(handles).await))
    }

    async fn put_batch(&self, table: &str, mutations: Vec<Mutation>) -> Result<()> {
        let count = mutations.len();
        self.executor
            .execute(table, move |handle| async move { handle.put(mutations).await })
            .await?;
        tracing::debug!(table = %table, rows = count, "Batch put applied");
        Ok(())
    }

    async fn delete_guarded(
        &self,
        table: &str,
        column: &Column,
        deletions: Vec<(Deletion, Option<i64>)>,
    ) -> ConflictReport {
        let mut row_ids = Vec::with_capacity(deletions.len());
        let mut handles = Vec::with_capacity(deletions.len());
        for (deletion, version) in deletions {
            let row = deletion.row_key().to_vec();
            let expected = version.map(encode_version);
            let column = column.clone();
            row_ids.push(row_id(&row));
            handles.push(
                self.executor
                    .execute_async(table, move |handle| async move {
                        handle
                            .check_and_delete(&row, &column, expected.as_deref(), deletion)
                            .await
                    }),
            );
        }

        collect_failures(table, row_ids, join_all(handles).await)
    }

    async fn delete_batch(&self, table: &str, deletions: Vec<Deletion>) -> Result<()> {
        let count = deletions.len();
        self.executor
            .execute(table, move |handle| async move { handle.delete(deletions).await })
            .await?;
        tracing::debug!(table = %table, rows = count, "Batch delete applied");
        Ok(())
    }
}

fn validate<E: Entity>(entities: &[E]) -> Result<()> {
    match entities.iter().find(|entity| !entity.is_valid()) {
        Some(entity) => Err(DaoError::Validation(format!(
            "Entity {} is not valid",
            entity.id()
        ))),
        None => Ok(()),
    }
}

fn row_id(row: &[u8]) -> String {
    String::from_utf8_lossy(row).into_owned()
}

/// Groups items by table, keeping first-seen table order and input order
/// within each group.
fn group_by_table<T>(pending: Vec<(String, T)>) -> Vec<(String, Vec<T>)> {
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();
    for (table, item) in pending {
        match groups.iter_mut().find(|(name, _)| *name == table) {
            Some((_, items)) => items.push(item),
            None => groups.push((table, vec![item])),
        }
    }
    groups
}

fn collect_failures(
    table: &str,
    row_ids: Vec<String>,
    results: Vec<StoreResult<bool>>,
) -> ConflictReport {
    row_ids
        .into_iter()
        .zip(results)
        .filter_map(|(row_id, result)| match result {
            Ok(true) => None,
            Ok(false) => Some(WriteFailure::version_mismatch(row_id, table)),
            Err(e) => Some(WriteFailure::incomplete(row_id, table, e.to_string())),
        })
        .inspect(|failure| {
            tracing::warn!(
                table = %failure.table,
                row = %failure.row_id,
                "{failure}"
            );
        })
        .collect()
}
