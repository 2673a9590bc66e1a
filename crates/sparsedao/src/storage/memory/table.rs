use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use sparsedao_core::filter::Scan;
use sparsedao_core::row::{Column, Deletion, Mutation, Row};
use sparsedao_core::storage::{StoreResult, Table};

/// One in-memory table.
///
/// Guarded writes evaluate their condition and apply under the same write
/// lock, which makes them atomic per table.
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    rows: RwLock<BTreeMap<Vec<u8>, Row>>,
    writes: AtomicUsize,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::new(BTreeMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of row mutations and deletions applied so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of rows currently stored.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn apply_mutation(rows: &mut BTreeMap<Vec<u8>, Row>, mutation: &Mutation) {
    let key = mutation.row().to_vec();
    let row = rows.entry(key.clone()).or_insert_with(|| Row::new(&key));
    row.apply(mutation);
    if row.is_empty() {
        rows.remove(&key);
    }
}

fn apply_deletion(rows: &mut BTreeMap<Vec<u8>, Row>, deletion: &Deletion) {
    if deletion.is_whole_row() {
        rows.remove(deletion.row_key());
        return;
    }
    let mut removal = Mutation::new(deletion.row_key());
    for column in deletion.columns() {
        removal.remove(column.clone());
    }
    if let Some(row) = rows.get_mut(deletion.row_key()) {
        row.apply(&removal);
        if row.is_empty() {
            rows.remove(deletion.row_key());
        }
    }
}

fn current_value<'a>(
    rows: &'a BTreeMap<Vec<u8>, Row>,
    row: &[u8],
    column: &Column,
) -> Option<&'a [u8]> {
    rows.get(row)
        .and_then(|stored| stored.get(&column.family, &column.qualifier))
}

#[async_trait]
impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, row: &[u8]) -> StoreResult<Option<Row>> {
        let rows = self.rows.read().await;
        Ok(rows.get(row).cloned())
    }

    async fn exists(&self, row: &[u8]) -> StoreResult<bool> {
        let rows = self.rows.read().await;
        Ok(rows.contains_key(row))
    }

    async fn scan(&self, scan: &Scan, limit: usize) -> StoreResult<Vec<Row>> {
        let rows = self.rows.read().await;
        let start = scan.start_row.clone().unwrap_or_default();
        Ok(rows
            .range(start..)
            .map(|(_, row)| row)
            .filter(|row| scan.accepts(row))
            .take(limit)
            .map(|row| scan.project(row.clone()))
            .collect())
    }

    async fn put(&self, mutations: Vec<Mutation>) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        for mutation in &mutations {
            apply_mutation(&mut rows, mutation);
        }
        self.writes.fetch_add(mutations.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn check_and_put(
        &self,
        row: &[u8],
        column: &Column,
        expected: Option<&[u8]>,
        mutation: Mutation,
    ) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        if current_value(&rows, row, column) != expected {
            return Ok(false);
        }
        apply_mutation(&mut rows, &mutation);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn delete(&self, deletions: Vec<Deletion>) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        for deletion in &deletions {
            apply_deletion(&mut rows, deletion);
        }
        self.writes.fetch_add(deletions.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn check_and_delete(
        &self,
        row: &[u8],
        column: &Column,
        expected: Option<&[u8]>,
        deletion: Deletion,
    ) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        if current_value(&rows, row, column) != expected {
            return Ok(false);
        }
        apply_deletion(&mut rows, &deletion);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
