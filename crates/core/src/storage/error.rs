use std::fmt;

use thiserror::Error;

use crate::filter::FilterError;

/// Errors raised by the underlying sparse store or the execution service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Store operation failed: {0}")]
    OperationFailed(String),
    #[error("Operation on table {table} timed out after {millis}ms")]
    Timeout { table: String, millis: u64 },
    #[error("Background task failed: {0}")]
    TaskFailed(String),
    #[error("Execution service is closed")]
    Closed,
}

/// Why a single guarded write did not land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The version column no longer held the expected value.
    VersionMismatch,
    /// The write errored or its task was lost before reporting.
    Incomplete(String),
}

/// One row that failed during an optimistic write or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub row_id: String,
    pub table: String,
    pub reason: FailureReason,
}

impl WriteFailure {
    pub fn version_mismatch(row_id: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            table: table.into(),
            reason: FailureReason::VersionMismatch,
        }
    }

    pub fn incomplete(
        row_id: impl Into<String>,
        table: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            table: table.into(),
            reason: FailureReason::Incomplete(cause.into()),
        }
    }
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::VersionMismatch => write!(
                f,
                "Operation of row {} from table {} has failed optimistically!",
                self.row_id, self.table
            ),
            FailureReason::Incomplete(cause) => write!(
                f,
                "Operation of row {} from table {} did not complete: {}",
                self.row_id, self.table, cause
            ),
        }
    }
}

/// Aggregate of every row that failed within one optimistic call.
///
/// Rows not listed here were applied and stay applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    failures: Vec<WriteFailure>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: WriteFailure) {
        self.failures.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[WriteFailure] {
        &self.failures
    }

    /// Ids of the rows that failed, in report order.
    pub fn row_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.row_id.as_str())
    }

    /// Turns a non-empty report into an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DaoError::Concurrency(self))
        }
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, failure) in self.failures.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl FromIterator<WriteFailure> for ConflictReport {
    fn from_iter<I: IntoIterator<Item = WriteFailure>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

/// Errors surfaced by the entity engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DaoError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Precondition failed: {0}")]
    Precondition(String),
    #[error("Concurrent modification: {0}")]
    Concurrency(ConflictReport),
    #[error("Conversion failed: {0}")]
    Conversion(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FilterError> for DaoError {
    fn from(error: FilterError) -> Self {
        DaoError::Configuration(error.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, DaoError>;
