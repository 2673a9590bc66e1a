//! The entity engine.
//!
//! [`EntityDao`] provides typed reads and concurrency-controlled writes for
//! one entity type over a sparse column-family store. It is assembled from
//! collaborators:
//!
//! - schema metadata ([`SchemaInfoProvider`](sparsedao_core::schema::SchemaInfoProvider))
//! - a [`RowConverter`] between entities and rows
//! - an [`ExecutorService`](crate::executor::ExecutorService) running store work
//! - optionally, a [`LockAttainer`] and a [`MergeService`]

mod builder;
mod engine;
mod read;
mod traits;
mod write;

pub use builder::EntityDaoBuilder;
pub use engine::EntityDao;
pub use traits::{LockAttainer, MergeService, RowConverter};
