//! Pure functions for mapping repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `DuplicateEmail` -> 400 (reported as a field error)
/// - `NotFound` -> 404
/// - `Conflict` -> 409
/// - `Unavailable` -> 503
/// - everything else -> 500
///
/// # Examples
///
/// ```
/// use postboard_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "User",
///     id: "1".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::DuplicateEmail { .. } => 400,
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::Conflict { .. } => 409,
        RepositoryError::Unavailable(_) => 503,
        RepositoryError::OwnerMismatch { .. }
        | RepositoryError::PartialFailure { .. }
        | RepositoryError::QueryFailed(_)
        | RepositoryError::InvalidData(_) => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_maps_to_400() {
        let error = RepositoryError::DuplicateEmail {
            email: "a@b.c".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 400);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let error = RepositoryError::NotFound {
            entity_type: "Micropost",
            id: "9".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 404);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let error = RepositoryError::Conflict {
            entity_type: "User",
            id: "1".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 409);
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let error = RepositoryError::Unavailable("deadline elapsed".to_string());
        assert_eq!(repository_error_to_status_code(&error), 503);
    }

    #[test]
    fn test_internal_kinds_map_to_500() {
        let mismatch = RepositoryError::OwnerMismatch {
            dimension: "user_email",
            value: "a@b.c".to_string(),
            expected_owner: 1,
            actual_owner: 2,
        };
        let partial = RepositoryError::PartialFailure {
            operation: "create",
            dimension: "user_email",
            value: "a@b.c".to_string(),
            owner_id: 1,
            reason: "timeout".to_string(),
        };

        assert_eq!(repository_error_to_status_code(&mismatch), 500);
        assert_eq!(repository_error_to_status_code(&partial), 500);
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::InvalidData("x".to_string())),
            500
        );
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::QueryFailed("x".to_string())),
            500
        );
    }
}
