use serde::{Deserialize, Serialize};

/// Which physical part of a row a logical property is matched against.
///
/// Exactly one policy applies per property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTarget {
    /// The property is the row key itself.
    RowKey,
    /// The property is encoded in qualifiers of `family` (qualifier-range prefix).
    QualifierRangePrefix { family: Vec<u8> },
    /// The property is stored as a cell value. An absent qualifier means
    /// "any qualifier of the family".
    Column {
        family: Vec<u8>,
        qualifier: Option<Vec<u8>>,
    },
}

/// Filtering policy for one logical property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub target: FilterTarget,
    /// Rows lacking the column fail the predicate instead of passing it.
    pub filter_if_missing: bool,
    /// Only the latest version of the cell is considered.
    pub latest_version_only: bool,
}

impl FilterConfig {
    pub fn row_key() -> Self {
        Self::with_target(FilterTarget::RowKey)
    }

    pub fn qualifier_range_prefix(family: impl AsRef<[u8]>) -> Self {
        Self::with_target(FilterTarget::QualifierRangePrefix {
            family: family.as_ref().to_vec(),
        })
    }

    pub fn column(family: impl AsRef<[u8]>, qualifier: impl AsRef<[u8]>) -> Self {
        Self::with_target(FilterTarget::Column {
            family: family.as_ref().to_vec(),
            qualifier: Some(qualifier.as_ref().to_vec()),
        })
    }

    /// A property spanning every qualifier of a family.
    pub fn family(family: impl AsRef<[u8]>) -> Self {
        Self::with_target(FilterTarget::Column {
            family: family.as_ref().to_vec(),
            qualifier: None,
        })
    }

    fn with_target(target: FilterTarget) -> Self {
        Self {
            target,
            filter_if_missing: false,
            latest_version_only: true,
        }
    }

    pub fn with_filter_if_missing(mut self, filter_if_missing: bool) -> Self {
        self.filter_if_missing = filter_if_missing;
        self
    }

    pub fn with_latest_version_only(mut self, latest_version_only: bool) -> Self {
        self.latest_version_only = latest_version_only;
        self
    }

    pub fn is_row_key(&self) -> bool {
        matches!(self.target, FilterTarget::RowKey)
    }

    pub fn is_qualifier_range_prefix(&self) -> bool {
        matches!(self.target, FilterTarget::QualifierRangePrefix { .. })
    }

    /// The column family, if the property lives in one.
    pub fn column_family(&self) -> Option<&[u8]> {
        match &self.target {
            FilterTarget::RowKey => None,
            FilterTarget::QualifierRangePrefix { family }
            | FilterTarget::Column { family, .. } => Some(family),
        }
    }

    /// The configured qualifier of a column property.
    pub fn column_qualifier(&self) -> Option<&[u8]> {
        match &self.target {
            FilterTarget::Column {
                qualifier: Some(qualifier),
                ..
            } if !qualifier.is_empty() => Some(qualifier),
            _ => None,
        }
    }
}
