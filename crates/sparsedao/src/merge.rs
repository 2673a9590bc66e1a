//! Field-level merge of pending mutations against stored rows.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sparsedao_core::row::{Column, Mutation, Row};
use sparsedao_core::storage::{LockType, StoreResult, Table};

use crate::dao::MergeService;

/// Drops stored cells an update no longer carries.
///
/// Converters write only the fields an entity has. Without a merge, a field
/// cleared on the entity would survive in the store. For each pending
/// mutation this reads the stored row and schedules removal of every stored
/// column in the families the mutation writes that the mutation does not
/// put. The version column is never removed. Both lock types merge the same.
#[derive(Debug, Clone, Default)]
pub struct DiffMergeService {
    version_column: Option<Column>,
}

impl DiffMergeService {
    pub fn new(version_column: Option<Column>) -> Self {
        Self { version_column }
    }
}

/// Stored columns in `mutation`'s families that it does not put.
fn dropped_columns(stored: &Row, mutation: &Mutation, keep: Option<&Column>) -> Vec<Column> {
    let families: BTreeSet<&[u8]> = mutation.families();
    stored
        .cells()
        .map(|(column, _)| column)
        .filter(|column| families.contains(column.family.as_slice()))
        .filter(|column| mutation.get(&column.family, &column.qualifier).is_none())
        .filter(|column| Some(*column) != keep)
        .cloned()
        .collect()
}

#[async_trait]
impl MergeService for DiffMergeService {
    async fn merge(
        &self,
        table: &dyn Table,
        mutations: &mut [Mutation],
        lock_type: LockType,
    ) -> StoreResult<()> {
        tracing::debug!(
            table = %table.name(),
            rows = mutations.len(),
            lock_type = ?lock_type,
            "Merging pending mutations"
        );

        for mutation in mutations.iter_mut() {
            let Some(stored) = table.get(mutation.row()).await? else {
                continue;
            };
            let dropped = dropped_columns(&stored, mutation, self.version_column.as_ref());
            for column in dropped {
                mutation.remove(column);
            }
        }
        Ok(())
    }
}
