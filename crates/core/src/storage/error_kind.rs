//! Pure classification of engine errors into stable labels.
//!
//! Callers that log, count or translate failures (for example into HTTP
//! statuses) match on these labels instead of on the error enum.

use super::DaoError;

/// Maps a [`DaoError`] to a stable, lowercase label.
///
/// - `Configuration` -> `"configuration"`
/// - `Validation` -> `"validation"`
/// - `Precondition` -> `"precondition"`
/// - `Concurrency` -> `"concurrency"`
/// - `Conversion` and `InvalidData` -> `"data"`
/// - `Store` -> `"store"`
///
/// # Examples
///
/// ```
/// use sparsedao_core::storage::{dao_error_kind, DaoError};
///
/// let error = DaoError::Precondition("row exists".to_string());
/// assert_eq!(dao_error_kind(&error), "precondition");
/// ```
pub fn dao_error_kind(error: &DaoError) -> &'static str {
    match error {
        DaoError::Configuration(_) => "configuration",
        DaoError::Validation(_) => "validation",
        DaoError::Precondition(_) => "precondition",
        DaoError::Concurrency(_) => "concurrency",
        DaoError::Conversion(_) | DaoError::InvalidData(_) => "data",
        DaoError::Store(_) => "store",
    }
}

/// Whether retrying the same call could succeed without caller changes.
pub fn is_retryable(error: &DaoError) -> bool {
    matches!(error, DaoError::Concurrency(_) | DaoError::Store(_))
}
