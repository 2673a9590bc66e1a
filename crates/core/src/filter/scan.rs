use serde::{Deserialize, Serialize};

use crate::row::{Column, Row};

use super::Filter;

/// A column or family requested in scan results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelector {
    Family(Vec<u8>),
    Column(Column),
}

impl ColumnSelector {
    fn selects(&self, column: &Column) -> bool {
        match self {
            ColumnSelector::Family(family) => column.family == *family,
            ColumnSelector::Column(selected) => selected == column,
        }
    }
}

/// A filter-bounded iteration over a table.
///
/// Rows are accepted on their full contents; the column selection only
/// shapes what is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    pub start_row: Option<Vec<u8>>,
    pub columns: Vec<ColumnSelector>,
    pub filter: Option<Filter>,
}

impl Scan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_row(mut self, row: impl AsRef<[u8]>) -> Self {
        self.start_row = Some(row.as_ref().to_vec());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn add_family(&mut self, family: impl AsRef<[u8]>) {
        let selector = ColumnSelector::Family(family.as_ref().to_vec());
        if !self.columns.contains(&selector) {
            self.columns.push(selector);
        }
    }

    pub fn add_column(&mut self, family: impl AsRef<[u8]>, qualifier: impl AsRef<[u8]>) {
        let selector = ColumnSelector::Column(Column::new(family, qualifier));
        if !self.columns.contains(&selector) {
            self.columns.push(selector);
        }
    }

    /// Whether `row` is at or after the start row and passes the filter.
    pub fn accepts(&self, row: &Row) -> bool {
        if let Some(start) = &self.start_row {
            if row.key() < start.as_slice() {
                return false;
            }
        }
        self.filter.as_ref().is_none_or(|filter| filter.matches(row))
    }

    /// Drops cells outside the column selection. An empty selection keeps all.
    pub fn project(&self, mut row: Row) -> Row {
        if !self.columns.is_empty() {
            row.retain(|column| self.columns.iter().any(|selector| selector.selects(column)));
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ColumnValueFilter, CompareOp, Comparator};

    fn person(key: &str, name: &str) -> Row {
        Row::new(key)
            .with_cell("info", "name", name)
            .with_cell("info", "age", "30")
            .with_cell("meta", "version", "1")
    }

    #[test]
    fn test_unbounded_scan_accepts_everything() {
        assert!(Scan::new().accepts(&person("a", "Ada")));
    }

    #[test]
    fn test_start_row_is_inclusive() {
        let scan = Scan::new().with_start_row("b");

        assert!(!scan.accepts(&person("a", "Ada")));
        assert!(scan.accepts(&person("b", "Bob")));
        assert!(scan.accepts(&person("c", "Cy")));
    }

    #[test]
    fn test_filter_is_applied() {
        let scan = Scan::new().with_filter(Filter::ColumnValue(ColumnValueFilter {
            family: b"info".to_vec(),
            qualifier: Some(b"name".to_vec()),
            op: CompareOp::Equal,
            comparator: Comparator::Binary(b"Ada".to_vec()),
            filter_if_missing: true,
            latest_version_only: true,
        }));

        assert!(scan.accepts(&person("a", "Ada")));
        assert!(!scan.accepts(&person("b", "Bob")));
    }

    #[test]
    fn test_project_keeps_selected_columns() {
        let mut scan = Scan::new();
        scan.add_column("info", "name");
        scan.add_family("meta");
        scan.add_family("meta");
        assert_eq!(scan.columns.len(), 2);

        let row = scan.project(person("a", "Ada"));

        assert_eq!(row.get(b"info", b"name"), Some(&b"Ada"[..]));
        assert_eq!(row.get(b"info", b"age"), None);
        assert_eq!(row.get(b"meta", b"version"), Some(&b"1"[..]));
    }

    #[test]
    fn test_project_without_selection_is_identity() {
        let row = person("a", "Ada");
        assert_eq!(Scan::new().project(row.clone()), row);
    }
}
