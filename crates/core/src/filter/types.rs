use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::row::Row;

/// Relation a cell must have to the comparator operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompareOp {
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
    GreaterOrEqual,
    Greater,
}

impl CompareOp {
    /// Applies the operator to the ordering of a cell relative to the operand.
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Less => ordering == Ordering::Less,
            CompareOp::LessOrEqual => ordering != Ordering::Greater,
            CompareOp::Equal => ordering == Ordering::Equal,
            CompareOp::NotEqual => ordering != Ordering::Equal,
            CompareOp::GreaterOrEqual => ordering != Ordering::Less,
            CompareOp::Greater => ordering == Ordering::Greater,
        }
    }
}

/// Strategy used to order a cell against an operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Full lexicographic byte comparison.
    Binary(Vec<u8>),
    /// Compares only the leading bytes of the cell.
    BinaryPrefix(Vec<u8>),
    /// Compares only the trailing bytes of the cell.
    BinarySuffix(Vec<u8>),
    /// Equal when the cell contains the operand, ignoring ASCII case.
    Substring(String),
    /// Equal when `first <= cell <= second`.
    Range { first: Vec<u8>, second: Vec<u8> },
}

impl Comparator {
    /// Orders `cell` relative to this comparator's operand.
    pub fn compare(&self, cell: &[u8]) -> Ordering {
        match self {
            Comparator::Binary(value) => cell.cmp(value.as_slice()),
            Comparator::BinaryPrefix(prefix) => {
                let len = prefix.len().min(cell.len());
                cell[..len].cmp(prefix.as_slice())
            }
            Comparator::BinarySuffix(suffix) => {
                let start = cell.len().saturating_sub(suffix.len());
                cell[start..].cmp(suffix.as_slice())
            }
            Comparator::Substring(needle) => {
                let haystack = String::from_utf8_lossy(cell).to_ascii_lowercase();
                if haystack.contains(&needle.to_ascii_lowercase()) {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            }
            Comparator::Range { first, second } => {
                if cell < first.as_slice() {
                    Ordering::Less
                } else if cell > second.as_slice() {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            }
        }
    }
}

/// How a [`Filter::List`] combines its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Logical AND.
    MustPassAll,
    /// Logical OR.
    MustPassOne,
}

/// Predicate on the value of one column (or of any column of a family).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnValueFilter {
    pub family: Vec<u8>,
    pub qualifier: Option<Vec<u8>>,
    pub op: CompareOp,
    pub comparator: Comparator,
    /// Rows lacking the column are rejected instead of accepted.
    pub filter_if_missing: bool,
    pub latest_version_only: bool,
}

/// A store-native row predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    RowKey {
        op: CompareOp,
        comparator: Comparator,
    },
    /// Passes rows having at least one qualifier in `family` that matches.
    Qualifier {
        family: Vec<u8>,
        op: CompareOp,
        comparator: Comparator,
    },
    ColumnValue(ColumnValueFilter),
    List {
        operator: FilterOperator,
        filters: Vec<Filter>,
    },
    Not(Box<Filter>),
}

impl Filter {
    /// Always-true predicate over the row key (empty prefix).
    pub fn match_all() -> Self {
        Filter::RowKey {
            op: CompareOp::Equal,
            comparator: Comparator::BinaryPrefix(Vec::new()),
        }
    }

    /// Overrides the missing-column policy of a column value predicate.
    /// No effect on other predicate kinds.
    pub fn set_filter_if_missing(&mut self, filter_if_missing: bool) {
        if let Filter::ColumnValue(filter) = self {
            filter.filter_if_missing = filter_if_missing;
        }
    }

    /// Evaluates this predicate against a row.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::RowKey { op, comparator } => op.matches(comparator.compare(row.key())),
            Filter::Qualifier {
                family,
                op,
                comparator,
            } => row
                .family(family)
                .any(|(qualifier, _)| op.matches(comparator.compare(qualifier))),
            Filter::ColumnValue(filter) => filter.matches(row),
            Filter::List {
                operator: FilterOperator::MustPassAll,
                filters,
            } => filters.iter().all(|filter| filter.matches(row)),
            Filter::List {
                operator: FilterOperator::MustPassOne,
                filters,
            } => filters.iter().any(|filter| filter.matches(row)),
            Filter::Not(inner) => !inner.matches(row),
        }
    }
}

impl ColumnValueFilter {
    fn matches(&self, row: &Row) -> bool {
        let values: Vec<&[u8]> = match &self.qualifier {
            Some(qualifier) => row.get(&self.family, qualifier).into_iter().collect(),
            None => row.family(&self.family).map(|(_, value)| value).collect(),
        };
        if values.is_empty() {
            return !self.filter_if_missing;
        }
        values
            .into_iter()
            .any(|value| self.op.matches(self.comparator.compare(value)))
    }
}
