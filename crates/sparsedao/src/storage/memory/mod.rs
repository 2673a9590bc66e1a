//! In-memory sparse store.
//!
//! Tables keep their rows in a `BTreeMap` keyed by row key, so scans walk
//! rows in bytewise key order like a real column-family store. Data is not
//! persisted and is lost when the store is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use sparsedao::storage::memory::MemoryStore;
//!
//! let store = MemoryStore::with_tables(["people"]);
//! // Hand `Arc::new(store)` to an `ExecutorService`...
//! ```

mod store;
mod table;

pub use store::MemoryStore;
pub use table::MemoryTable;
