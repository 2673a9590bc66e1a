//! Read path: point lookups, best-effort bulk lookups and filtered scans.

use std::collections::HashSet;
use std::sync::Arc;

use sparsedao_core::filter::{FilterCompiler, Scan};
use sparsedao_core::query::{max_results, QueryParameter};
use sparsedao_core::row::Row;
use sparsedao_core::storage::{Entity, Result};

use crate::executor::join_all;

use super::engine::EntityDao;

impl<E: Entity> EntityDao<E> {
    /// Fetches one entity. Store and conversion errors are returned.
    pub async fn get_by_id(&self, id: &E::Id) -> Result<Option<E>> {
        let key = self.schema.row_key_from_id(id);
        let row = self
            .executor
            .execute(self.table(), move |table| async move { table.get(&key).await })
            .await?;

        match row {
            Some(row) => self.converter.from_row(&row, &self.executor).await,
            None => Ok(None),
        }
    }

    /// Fetches several entities concurrently, one lookup per distinct id.
    ///
    /// Missing ids are omitted. Lookups or conversions that fail are logged
    /// and omitted too; they never fail the batch.
    pub async fn get_by_ids(&self, ids: &[E::Id]) -> Result<Vec<E>> {
        let mut seen = HashSet::new();
        let keys: Vec<Vec<u8>> = ids
            .iter()
            .map(|id| self.schema.row_key_from_id(id))
            .filter(|key| seen.insert(key.clone()))
            .collect();

        let handles = keys
            .iter()
            .cloned()
            .map(|key| {
                self.executor
                    .execute_async(self.table(), move |table| async move {
                        table.get(&key).await
                    })
            })
            .collect();

        let mut rows = Vec::with_capacity(keys.len());
        for (key, result) in keys.iter().zip(join_all(handles).await) {
            match result {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {
                    tracing::debug!(
                        table = %self.table(),
                        row = %String::from_utf8_lossy(key),
                        "Row not found"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        table = %self.table(),
                        row = %String::from_utf8_lossy(key),
                        error = %e,
                        "Dropping row from bulk read"
                    );
                }
            }
        }

        Ok(self.convert_rows(rows).await)
    }

    /// First entity matching `params`, in row-key order.
    pub async fn get_single(&self, params: &[QueryParameter]) -> Result<Option<E>> {
        match self.get_raw(params).await? {
            Some(row) => self.converter.from_row(&row, &self.executor).await,
            None => Ok(None),
        }
    }

    /// Entities matching `params`, bounded by the smaller of an explicit
    /// `MaxResults` and the configured row cap.
    ///
    /// Rows that fail conversion are logged and omitted.
    pub async fn get_list(&self, params: &[QueryParameter]) -> Result<Vec<E>> {
        let rows = self.get_raw_list(params).await?;
        Ok(self.convert_rows(rows).await)
    }

    /// Every entity of the table, up to the configured row cap.
    pub async fn get_all(&self) -> Result<Vec<E>> {
        self.get_list(&[]).await
    }

    /// First row matching `params`, without conversion.
    pub async fn get_raw(&self, params: &[QueryParameter]) -> Result<Option<Row>> {
        let scan = self.form_scan(params)?;
        let mut rows = self.scan(scan, 1).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Rows matching `params`, without conversion. Bounded like [`Self::get_list`].
    pub async fn get_raw_list(&self, params: &[QueryParameter]) -> Result<Vec<Row>> {
        let scan = self.form_scan(params)?;
        let limit = self.list_limit(params);
        let rows = self.scan(scan, limit).await?;

        let mut seen = HashSet::new();
        Ok(rows
            .into_iter()
            .filter(|row| seen.insert(row.key().to_vec()))
            .collect())
    }

    fn form_scan(&self, params: &[QueryParameter]) -> Result<Scan> {
        Ok(FilterCompiler::new(self.schema.as_ref()).form_scan(params)?)
    }

    fn list_limit(&self, params: &[QueryParameter]) -> usize {
        max_results(params).map_or(self.config.max_rows, |count| {
            count.min(self.config.max_rows)
        })
    }

    async fn scan(&self, scan: Scan, limit: usize) -> Result<Vec<Row>> {
        let rows = self
            .executor
            .execute(self.table(), move |table| async move {
                table.scan(&scan, limit).await
            })
            .await?;

        tracing::debug!(table = %self.table(), rows = rows.len(), limit, "Scan completed");
        Ok(rows)
    }

    /// Converts rows concurrently, one task per row, keeping row order.
    async fn convert_rows(&self, rows: Vec<Row>) -> Vec<E> {
        let tasks = rows.into_iter().map(|row| {
            let converter = Arc::clone(&self.converter);
            let executor = self.executor.clone();
            tokio::spawn(async move {
                let result = converter.from_row(&row, &executor).await;
                (row, result)
            })
        });

        let mut entities = Vec::new();
        for joined in futures_util::future::join_all(tasks).await {
            match joined {
                Ok((_, Ok(Some(entity)))) => entities.push(entity),
                Ok((row, Ok(None))) => {
                    tracing::debug!(
                        row = %String::from_utf8_lossy(row.key()),
                        "Converter skipped row"
                    );
                }
                Ok((row, Err(e))) => {
                    tracing::warn!(
                        row = %String::from_utf8_lossy(row.key()),
                        error = %e,
                        "Dropping row that failed conversion"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Row conversion task failed");
                }
            }
        }
        entities
    }
}
