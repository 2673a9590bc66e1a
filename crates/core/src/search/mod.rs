//! Contracts of the free-text index companion DAO.

mod error;
mod traits;

pub use error::{Result, SearchError};
pub use traits::{Document, DocumentAdapter, FreeTextPersistentDao, IdentifierQuery, SearchWriter};
