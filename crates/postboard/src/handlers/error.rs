use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use postboard_core::storage::{repository_error_to_status_code, RepositoryError};

const CHECK_INPUT: &str = "Please check your input.";
const DUPLICATE_EMAIL: &str = "This email address is already registered.";

/// Error returned by every API handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field name -> message, from the validation rule tables.
    #[error("invalid input: {0:?}")]
    Validation(BTreeMap<String, String>),
    /// The request could not be decoded (bad JSON, bad path parameter).
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn field_errors(errors: BTreeMap<String, String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": CHECK_INPUT, "errors": errors })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                tracing::warn!(?errors, "Validation errors occurred");
                field_errors(errors)
            }
            Self::BadRequest(reason) => {
                tracing::warn!(%reason, "Rejected malformed request");
                message(StatusCode::BAD_REQUEST, CHECK_INPUT)
            }
            Self::Repository(RepositoryError::DuplicateEmail { email }) => {
                tracing::warn!(%email, "Email already registered");
                field_errors(BTreeMap::from([(
                    "email".to_string(),
                    DUPLICATE_EMAIL.to_string(),
                )]))
            }
            Self::Repository(err) => {
                let status = StatusCode::from_u16(repository_error_to_status_code(&err))
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

                match status {
                    StatusCode::NOT_FOUND => message(status, "Not found."),
                    StatusCode::CONFLICT => {
                        tracing::warn!(error = %err, "Concurrent modification");
                        message(status, "The resource was modified concurrently. Please retry.")
                    }
                    StatusCode::SERVICE_UNAVAILABLE => {
                        tracing::error!(error = %err, "Store unavailable");
                        message(status, "The service is temporarily unavailable. Please retry.")
                    }
                    _ => {
                        tracing::error!(error = %err, "Internal server error");
                        message(status, "A server error occurred.")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_field_error() {
        let (status, json) = render(ApiError::from(RepositoryError::DuplicateEmail {
            email: "taro@example.com".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], CHECK_INPUT);
        assert_eq!(json["errors"]["email"], DUPLICATE_EMAIL);
    }

    #[tokio::test]
    async fn test_not_found() {
        let (status, json) = render(ApiError::from(RepositoryError::NotFound {
            entity_type: "User",
            id: "9".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({"message": "Not found."}));
    }

    #[tokio::test]
    async fn test_partial_failure_hides_details() {
        let (status, json) = render(ApiError::from(RepositoryError::PartialFailure {
            operation: "delete",
            dimension: "user_email",
            value: "taro@example.com".to_string(),
            owner_id: 1,
            reason: "timeout".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({"message": "A server error occurred."}));
    }

    #[tokio::test]
    async fn test_unavailable_is_503() {
        let (status, _) = render(ApiError::from(RepositoryError::Unavailable(
            "deadline".to_string(),
        )))
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
