use thiserror::Error;

/// Errors raised by a [`TableClient`](super::TableClient) backend.
///
/// These never cross the repository boundary; they are translated into
/// [`RepositoryError`] first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport failure, throttling or an elapsed deadline. The outcome of
    /// the call is unknown.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// The store rejected the request.
    #[error("Store request failed: {0}")]
    Failed(String),
    /// A stored item could not be decoded.
    #[error("Malformed item: {0}")]
    Malformed(String),
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

/// Result type for table client operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Email already registered: {email}")]
    DuplicateEmail { email: String },
    /// An optimistic precondition lost a race. Safe to retry.
    #[error("{entity_type} was modified concurrently: {id}")]
    Conflict {
        entity_type: &'static str,
        id: String,
    },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Claim {dimension}={value} expected owner {expected_owner} but is held by {actual_owner}")]
    OwnerMismatch {
        dimension: &'static str,
        value: String,
        expected_owner: u64,
        actual_owner: u64,
    },
    /// A compensating step failed and the store needs manual reconciliation.
    #[error("Partial failure during {operation}: claim {dimension}={value} of owner {owner_id} left inconsistent: {reason}")]
    PartialFailure {
        operation: &'static str,
        dimension: &'static str,
        value: String,
        owner_id: u64,
        reason: String,
    },
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RepositoryError::Unavailable(_) | RepositoryError::Conflict { .. }
        )
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => RepositoryError::Unavailable(msg),
            StoreError::Failed(msg) => RepositoryError::QueryFailed(msg),
            StoreError::Unsupported(op) => {
                RepositoryError::QueryFailed(format!("unsupported operation: {op}"))
            }
            StoreError::Malformed(msg) => RepositoryError::InvalidData(msg),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_not_found_display() {
        let error = RepositoryError::NotFound {
            entity_type: "User",
            id: "42".to_string(),
        };
        assert_eq!(error.to_string(), "User not found: 42");
    }

    #[test]
    fn test_repository_error_duplicate_email_display() {
        let error = RepositoryError::DuplicateEmail {
            email: "taro@example.com".to_string(),
        };
        assert_eq!(error.to_string(), "Email already registered: taro@example.com");
    }

    #[test]
    fn test_repository_error_owner_mismatch_display() {
        let error = RepositoryError::OwnerMismatch {
            dimension: "user_email",
            value: "taro@example.com".to_string(),
            expected_owner: 1,
            actual_owner: 2,
        };
        assert_eq!(
            error.to_string(),
            "Claim user_email=taro@example.com expected owner 1 but is held by 2"
        );
    }

    #[test]
    fn test_repository_error_partial_failure_display() {
        let error = RepositoryError::PartialFailure {
            operation: "delete",
            dimension: "user_email",
            value: "taro@example.com".to_string(),
            owner_id: 1,
            reason: "timeout".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Partial failure during delete: claim user_email=taro@example.com of owner 1 left inconsistent: timeout"
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(RepositoryError::Unavailable("x".to_string()).is_retryable());
        assert!(RepositoryError::Conflict {
            entity_type: "User",
            id: "1".to_string()
        }
        .is_retryable());
        assert!(!RepositoryError::DuplicateEmail {
            email: "a@b.c".to_string()
        }
        .is_retryable());
        assert!(!RepositoryError::InvalidData("x".to_string()).is_retryable());
    }

    #[test]
    fn test_store_error_conversion() {
        assert_eq!(
            RepositoryError::from(StoreError::Unavailable("timed out".to_string())),
            RepositoryError::Unavailable("timed out".to_string())
        );
        assert_eq!(
            RepositoryError::from(StoreError::Malformed("missing id".to_string())),
            RepositoryError::InvalidData("missing id".to_string())
        );
        assert_eq!(
            RepositoryError::from(StoreError::Unsupported("transact_write")),
            RepositoryError::QueryFailed("unsupported operation: transact_write".to_string())
        );
    }
}
