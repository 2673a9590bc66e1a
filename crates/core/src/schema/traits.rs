use crate::row::Column;

use super::FilterConfig;

/// Resolves logical property names to their physical filter policy.
pub trait FilterMetadata: Send + Sync {
    /// Returns the policy for a dotted property path, or `None` if unmapped.
    fn filter_config(&self, property: &str) -> Option<&FilterConfig>;
}

/// Schema metadata for one entity type.
pub trait SchemaInfoProvider<Id>: FilterMetadata {
    /// Table holding the entity's primary rows.
    fn main_table_name(&self) -> &str;

    /// Derives the row key of an entity from its id.
    fn row_key_from_id(&self, id: &Id) -> Vec<u8>;

    /// Recovers the id from a row key, if it is well formed.
    fn id_from_row_key(&self, row_key: &[u8]) -> Option<Id>;

    /// Column holding the optimistic-lock version, if versioning is enabled.
    fn version_column(&self) -> Option<&Column>;
}
