use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;

use postboard_core::board::{hello_message, HELLO_RULES};

use crate::{
    handlers::{parse_body, ApiError},
    models::{HelloPayload, HelloResponse},
};

/// Greet the caller (POST /v1/hello).
pub async fn hello(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<HelloResponse>, ApiError> {
    let payload: HelloPayload = parse_body(body, HELLO_RULES)?;

    Ok(Json(HelloResponse {
        message: hello_message(&payload.name),
    }))
}
