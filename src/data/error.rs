//! Error types for the task and daily-metric stores.

/// Errors returned by the stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Malformed or missing required input (empty content, bad date).
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation targeted a task id that does not exist.
    #[error("task not found: {0}")]
    NotFound(i64),

    /// The underlying SQLite database failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl StoreError {
    #[allow(dead_code)] // Used in tests
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound(42);
        assert_eq!(err.to_string(), "task not found: 42");
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_storage_error_conversion() {
        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(err.to_string().starts_with("storage error"));
    }
}
