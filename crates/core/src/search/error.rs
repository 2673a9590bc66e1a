use thiserror::Error;

/// Errors raised by free-text index operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Document conversion failed: {0}")]
    Adapter(String),
    #[error("Index write failed: {0}")]
    Writer(String),
    #[error("{} index operation(s) failed: {}", .0.len(), .0.join("; "))]
    Incomplete(Vec<String>),
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_display() {
        let error = SearchError::Incomplete(vec![
            "Index write failed: status 500".to_string(),
            "Document conversion failed: no id".to_string(),
        ]);
        assert_eq!(
            error.to_string(),
            "2 index operation(s) failed: Index write failed: status 500; \
             Document conversion failed: no id"
        );
    }

    #[test]
    fn test_writer_display() {
        let error = SearchError::Writer("status 400".to_string());
        assert_eq!(error.to_string(), "Index write failed: status 400");
    }
}
