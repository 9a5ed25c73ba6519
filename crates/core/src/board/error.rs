use thiserror::Error;

/// A single field-level validation failure.
///
/// The display text is what the HTTP layer returns under `errors.<field>`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{label} is required.")]
    Required { label: &'static str },
    #[error("{label} is not a valid email address.")]
    InvalidEmail { label: &'static str },
    #[error("{label} must be at most {max} characters.")]
    TooLong { label: &'static str, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::Required { label: "Name" }.to_string(),
            "Name is required."
        );
        assert_eq!(
            ValidationError::InvalidEmail { label: "Email" }.to_string(),
            "Email is not a valid email address."
        );
        assert_eq!(
            ValidationError::TooLong {
                label: "Content",
                max: 140
            }
            .to_string(),
            "Content must be at most 140 characters."
        );
    }
}
