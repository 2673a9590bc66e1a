use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Physical address of a cell: column family plus qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Column {
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
}

impl Column {
    /// Creates a column address from anything byte-like.
    pub fn new(family: impl AsRef<[u8]>, qualifier: impl AsRef<[u8]>) -> Self {
        Self {
            family: family.as_ref().to_vec(),
            qualifier: qualifier.as_ref().to_vec(),
        }
    }
}

/// Encodes cell maps as `[column, value]` pairs; JSON map keys must be strings.
mod cell_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::Column;

    pub fn serialize<S: Serializer>(
        cells: &BTreeMap<Column, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(cells.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Column, Vec<u8>>, D::Error> {
        let cells: Vec<(Column, Vec<u8>)> = Vec::deserialize(deserializer)?;
        Ok(cells.into_iter().collect())
    }
}

/// A stored row: its key and the latest value of each populated cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    key: Vec<u8>,
    #[serde(with = "cell_list")]
    cells: BTreeMap<Column, Vec<u8>>,
}

impl Row {
    /// Creates an empty row with the given key.
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
            cells: BTreeMap::new(),
        }
    }

    /// Adds a cell to this row.
    pub fn with_cell(
        mut self,
        family: impl AsRef<[u8]>,
        qualifier: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Self {
        self.cells
            .insert(Column::new(family, qualifier), value.as_ref().to_vec());
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns true if the row carries no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the value stored at `family:qualifier`, if any.
    pub fn get(&self, family: &[u8], qualifier: &[u8]) -> Option<&[u8]> {
        self.cells
            .get(&Column::new(family, qualifier))
            .map(Vec::as_slice)
    }

    /// Iterates the cells of one family as `(qualifier, value)` pairs.
    pub fn family<'a>(&'a self, family: &'a [u8]) -> impl Iterator<Item = (&'a [u8], &'a [u8])> {
        self.cells
            .iter()
            .filter(move |(column, _)| column.family == family)
            .map(|(column, value)| (column.qualifier.as_slice(), value.as_slice()))
    }

    /// Iterates every cell in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&Column, &[u8])> {
        self.cells
            .iter()
            .map(|(column, value)| (column, value.as_slice()))
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&Column) -> bool) {
        self.cells.retain(|column, _| keep(column));
    }

    /// Applies a mutation to this row: removals first, then puts.
    pub fn apply(&mut self, mutation: &Mutation) {
        for column in &mutation.removals {
            self.cells.remove(column);
        }
        for (column, value) in &mutation.puts {
            self.cells.insert(column.clone(), value.clone());
        }
    }
}

/// A pending write against a single row.
///
/// A mutation carries cell puts and, optionally, cells to remove in the same
/// atomic step (used by merge services to reconcile dropped fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    row: Vec<u8>,
    #[serde(with = "cell_list")]
    puts: BTreeMap<Column, Vec<u8>>,
    removals: BTreeSet<Column>,
}

impl Mutation {
    pub fn new(row: impl AsRef<[u8]>) -> Self {
        Self {
            row: row.as_ref().to_vec(),
            puts: BTreeMap::new(),
            removals: BTreeSet::new(),
        }
    }

    /// Builder form of [`Mutation::put`].
    pub fn with_put(
        mut self,
        family: impl AsRef<[u8]>,
        qualifier: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Self {
        self.put(family, qualifier, value);
        self
    }

    /// Sets a cell, replacing any value previously staged for it.
    pub fn put(
        &mut self,
        family: impl AsRef<[u8]>,
        qualifier: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) {
        let column = Column::new(family, qualifier);
        self.removals.remove(&column);
        self.puts.insert(column, value.as_ref().to_vec());
    }

    /// Schedules a cell for removal unless the mutation also puts it.
    pub fn remove(&mut self, column: Column) {
        if !self.puts.contains_key(&column) {
            self.removals.insert(column);
        }
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Returns the value this mutation puts at `family:qualifier`.
    pub fn get(&self, family: &[u8], qualifier: &[u8]) -> Option<&[u8]> {
        self.puts
            .get(&Column::new(family, qualifier))
            .map(Vec::as_slice)
    }

    /// Families this mutation writes to.
    pub fn families(&self) -> BTreeSet<&[u8]> {
        self.puts
            .keys()
            .map(|column| column.family.as_slice())
            .collect()
    }

    pub fn puts(&self) -> impl Iterator<Item = (&Column, &[u8])> {
        self.puts
            .iter()
            .map(|(column, value)| (column, value.as_slice()))
    }

    pub fn removals(&self) -> impl Iterator<Item = &Column> {
        self.removals.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.removals.is_empty()
    }
}

/// A pending delete of a whole row or of selected cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    row: Vec<u8>,
    columns: Vec<Column>,
}

impl Deletion {
    /// Deletes the entire row.
    pub fn row(row: impl AsRef<[u8]>) -> Self {
        Self {
            row: row.as_ref().to_vec(),
            columns: Vec::new(),
        }
    }

    /// Restricts the deletion to one cell. Can be chained.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn row_key(&self) -> &[u8] {
        &self.row
    }

    /// Returns true when the whole row is deleted.
    pub fn is_whole_row(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}
