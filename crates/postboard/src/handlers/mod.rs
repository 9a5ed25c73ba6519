pub mod error;
pub mod health;
pub mod hello;
pub mod microposts;
pub mod users;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::Path,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use postboard_core::board::{validate, FieldRules};

pub use error::ApiError;

/// Decodes a JSON body, checks it against `rules`, then deserializes it.
pub(crate) fn parse_body<P: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
    rules: &[FieldRules],
) -> Result<P, ApiError> {
    let Json(value) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let errors = validate(&value, rules);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    serde_json::from_value(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Unwraps path parameters, turning a non-numeric id into a 400.
pub(crate) fn parse_path<P>(path: Result<Path<P>, PathRejection>) -> Result<P, ApiError> {
    path.map(|Path(params)| params)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use postboard_core::board::USER_RULES;
    use serde_json::json;

    use crate::models::UserPayload;

    #[test]
    fn test_parse_body_reports_every_field() {
        let result = parse_body::<UserPayload>(Ok(Json(json!({"email": "nope"}))), USER_RULES);

        let Err(ApiError::Validation(errors)) = result else {
            panic!("expected validation errors");
        };
        assert_eq!(errors["user_name"], "Name is required.");
        assert_eq!(errors["email"], "Email is not a valid email address.");
    }

    #[test]
    fn test_parse_body_accepts_valid_payload() {
        let payload: UserPayload = parse_body(
            Ok(Json(json!({"user_name": "Taro", "email": "taro@example.com"}))),
            USER_RULES,
        )
        .unwrap();

        assert_eq!(payload.user_name, "Taro");
        assert_eq!(payload.email, "taro@example.com");
    }
}
