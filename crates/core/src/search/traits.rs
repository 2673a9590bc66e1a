use async_trait::async_trait;

use super::Result;

/// A document as handed to the index: a flat JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Keeps a free-text index in step with persisted data.
#[async_trait]
pub trait FreeTextPersistentDao<T>: Send + Sync {
    async fn save(&self, data: Vec<T>) -> Result<()>;

    /// Replaces the indexed documents of `data`.
    async fn update(&self, data: Vec<T>) -> Result<()>;

    async fn delete(&self, data: Vec<T>) -> Result<()>;
}

/// Converts a datum to its index document.
pub trait DocumentAdapter<T>: Send + Sync {
    fn to_document(&self, datum: &T) -> Result<Document>;
}

/// Builds the index query that selects exactly the documents of a datum.
pub trait IdentifierQuery<T>: Send + Sync {
    fn query_for(&self, datum: &T) -> String;
}

/// Write side of a search index.
#[async_trait]
pub trait SearchWriter: Send + Sync {
    async fn add(&self, document: Document) -> Result<()>;

    async fn delete_by_query(&self, query: &str) -> Result<()>;
}
