//! Declarative request validation.
//!
//! Each request body is checked against a static table of [`FieldRules`].
//! The first failing rule of a field wins; fields are reported independently.

use std::collections::BTreeMap;

use serde_json::Value;

use super::error::ValidationError;
use super::operations::{is_valid_email, EMAIL_MAX_CHARS, MICROPOST_MAX_CHARS};

/// A single check applied to a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present, a string, and not blank.
    Required,
    /// Syntactically an email address.
    Email,
    /// At most this many characters.
    MaxChars(usize),
}

/// The rules for one named field of a JSON body.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    /// Human-readable name used in messages.
    pub label: &'static str,
    pub rules: &'static [Rule],
}

pub const USER_RULES: &[FieldRules] = &[
    FieldRules {
        field: "user_name",
        label: "Name",
        rules: &[Rule::Required],
    },
    FieldRules {
        field: "email",
        label: "Email",
        rules: &[Rule::Required, Rule::MaxChars(EMAIL_MAX_CHARS), Rule::Email],
    },
];

pub const MICROPOST_RULES: &[FieldRules] = &[FieldRules {
    field: "content",
    label: "Content",
    rules: &[Rule::Required, Rule::MaxChars(MICROPOST_MAX_CHARS)],
}];

pub const HELLO_RULES: &[FieldRules] = &[FieldRules {
    field: "name",
    label: "Name",
    rules: &[Rule::Required],
}];

fn check(rule: Rule, label: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match (rule, value) {
        (Rule::Required, Some(v)) if !v.trim().is_empty() => Ok(()),
        (Rule::Required, _) => Err(ValidationError::Required { label }),
        (Rule::Email, Some(v)) if !is_valid_email(v.trim()) => {
            Err(ValidationError::InvalidEmail { label })
        }
        (Rule::MaxChars(max), Some(v)) if v.chars().count() > max => {
            Err(ValidationError::TooLong { label, max })
        }
        _ => Ok(()),
    }
}

/// Validates `body` against `rules`, returning field name -> message.
///
/// An empty map means the body is valid. Non-string values count as missing.
///
/// # Examples
///
/// ```
/// use postboard_core::board::{validate, HELLO_RULES};
///
/// let errors = validate(&serde_json::json!({ "name": "" }), HELLO_RULES);
/// assert_eq!(errors["name"], "Name is required.");
/// ```
pub fn validate(body: &Value, rules: &[FieldRules]) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    for field in rules {
        let value = body.get(field.field).and_then(Value::as_str);
        let failure = field
            .rules
            .iter()
            .find_map(|rule| check(*rule, field.label, value).err());

        if let Some(err) = failure {
            errors.insert(field.field.to_string(), err.to_string());
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_valid_user_body() {
        let body = json!({ "user_name": "Taro", "email": "taro@example.com" });
        assert!(validate(&body, USER_RULES).is_empty());
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = validate(&json!({}), USER_RULES);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors["user_name"], "Name is required.");
        assert_eq!(errors["email"], "Email is required.");
    }

    #[test]
    fn test_blank_and_non_string_count_as_missing() {
        let errors = validate(&json!({ "user_name": "   ", "email": 42 }), USER_RULES);

        assert_eq!(errors["user_name"], "Name is required.");
        assert_eq!(errors["email"], "Email is required.");
    }

    #[test]
    fn test_invalid_email_reported_after_required() {
        let errors = validate(&json!({ "user_name": "Taro", "email": "taro" }), USER_RULES);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors["email"], "Email is not a valid email address.");
    }

    #[test]
    fn test_overlong_email_reports_length() {
        let email = format!("{}@example.com", "a".repeat(EMAIL_MAX_CHARS));
        let errors = validate(&json!({ "user_name": "Taro", "email": email }), USER_RULES);

        assert_eq!(errors["email"], "Email must be at most 255 characters.");
    }

    #[test]
    fn test_content_limit_counts_characters() {
        let at_limit = "あ".repeat(MICROPOST_MAX_CHARS);
        assert!(validate(&json!({ "content": at_limit }), MICROPOST_RULES).is_empty());

        let over = "a".repeat(MICROPOST_MAX_CHARS + 1);
        let errors = validate(&json!({ "content": over }), MICROPOST_RULES);
        assert_eq!(errors["content"], "Content must be at most 140 characters.");
    }

    #[test]
    fn test_hello_requires_name() {
        let errors = validate(&json!({ "name": "" }), HELLO_RULES);
        assert_eq!(errors["name"], "Name is required.");

        assert!(validate(&json!({ "name": "Taro" }), HELLO_RULES).is_empty());
    }
}
