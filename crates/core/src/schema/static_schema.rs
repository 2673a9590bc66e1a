use std::collections::HashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::row::Column;

use super::{FilterConfig, FilterMetadata, SchemaInfoProvider};

/// Declarative schema metadata for entities whose ids round-trip through
/// their string form.
///
/// Row keys are `row_key_prefix + id.to_string()`.
///
/// ```
/// use sparsedao_core::schema::{FilterConfig, FilterMetadata, SchemaInfo, SchemaInfoProvider};
///
/// let schema: SchemaInfo<String> = SchemaInfo::new("people")
///     .with_filter("name", FilterConfig::column("info", "name"))
///     .with_version_column("meta", "version");
///
/// assert_eq!(schema.main_table_name(), "people");
/// assert!(schema.filter_config("name").is_some());
/// assert_eq!(schema.row_key_from_id(&"A".to_string()), b"A".to_vec());
/// ```
#[derive(Debug, Clone)]
pub struct SchemaInfo<Id> {
    table: String,
    row_key_prefix: String,
    filters: HashMap<String, FilterConfig>,
    version_column: Option<Column>,
    _id: PhantomData<fn() -> Id>,
}

impl<Id> SchemaInfo<Id> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row_key_prefix: String::new(),
            filters: HashMap::new(),
            version_column: None,
            _id: PhantomData,
        }
    }

    /// Prefixes every row key, e.g. to share a table between entity types.
    pub fn with_row_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.row_key_prefix = prefix.into();
        self
    }

    /// Maps a dotted property path to its filter policy.
    pub fn with_filter(mut self, property: impl Into<String>, config: FilterConfig) -> Self {
        self.filters.insert(property.into(), config);
        self
    }

    /// Enables optimistic versioning on `family:qualifier`.
    pub fn with_version_column(
        mut self,
        family: impl AsRef<[u8]>,
        qualifier: impl AsRef<[u8]>,
    ) -> Self {
        self.version_column = Some(Column::new(family, qualifier));
        self
    }
}

impl<Id> FilterMetadata for SchemaInfo<Id> {
    fn filter_config(&self, property: &str) -> Option<&FilterConfig> {
        self.filters.get(property)
    }
}

impl<Id> SchemaInfoProvider<Id> for SchemaInfo<Id>
where
    Id: Display + FromStr,
{
    fn main_table_name(&self) -> &str {
        &self.table
    }

    fn row_key_from_id(&self, id: &Id) -> Vec<u8> {
        format!("{}{}", self.row_key_prefix, id).into_bytes()
    }

    fn id_from_row_key(&self, row_key: &[u8]) -> Option<Id> {
        let key = std::str::from_utf8(row_key).ok()?;
        key.strip_prefix(self.row_key_prefix.as_str())?.parse().ok()
    }

    fn version_column(&self) -> Option<&Column> {
        self.version_column.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_key_round_trip_with_prefix() {
        let schema: SchemaInfo<u64> = SchemaInfo::new("orders").with_row_key_prefix("order#");

        let key = schema.row_key_from_id(&17);
        assert_eq!(key, b"order#17".to_vec());
        assert_eq!(schema.id_from_row_key(&key), Some(17));
    }

    #[test]
    fn test_id_from_foreign_row_key() {
        let schema: SchemaInfo<u64> = SchemaInfo::new("orders").with_row_key_prefix("order#");

        assert_eq!(schema.id_from_row_key(b"user#17"), None);
        assert_eq!(schema.id_from_row_key(b"order#abc"), None);
    }

    #[test]
    fn test_unmapped_property() {
        let schema: SchemaInfo<String> = SchemaInfo::new("people");
        assert!(schema.filter_config("unknown").is_none());
        assert!(schema.version_column().is_none());
    }
}
