mod error;
mod error_kind;
mod traits;

pub use error::{
    ConflictReport, DaoError, FailureReason, Result, StoreError, StoreResult, WriteFailure,
};
pub use error_kind::{dao_error_kind, is_retryable};
pub use traits::{Entity, LockType, Table, TableProvider};
