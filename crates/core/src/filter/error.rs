use thiserror::Error;

/// Errors raised while compiling a query tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("No filter configuration for property {0}")]
    UnresolvedProperty(String),
}
