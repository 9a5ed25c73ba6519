//! User CRUD handlers.
//!
//! Email uniqueness is enforced by the repository; a taken email comes back
//! as `RepositoryError::DuplicateEmail` and renders as a field error.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;

use postboard_core::board::USER_RULES;
use postboard_core::storage::RepositoryError;

use crate::{
    handlers::{parse_body, parse_path, ApiError},
    models::{OkResponse, UserPayload, UserResponse, UsersResponse},
    state::AppState,
};

fn not_found(user_id: u64) -> ApiError {
    ApiError::Repository(RepositoryError::NotFound {
        entity_type: "User",
        id: user_id.to_string(),
    })
}

/// List all users (GET /v1/users).
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.users.list().await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// Create a new user (POST /v1/users).
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    let payload: UserPayload = parse_body(body, USER_RULES)?;

    let user = state
        .users
        .create(payload.user_name.trim(), &payload.email)
        .await?;

    Ok((StatusCode::CREATED, Json(OkResponse::created(user.id))))
}

/// Get a single user (GET /v1/users/{user_id}).
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_path(path)?;

    match state.users.get_by_id(user_id).await? {
        Some(user) => Ok(Json(user.into())),
        None => Err(not_found(user_id)),
    }
}

/// Update a user's name and email (PUT /v1/users/{user_id}).
pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let user_id = parse_path(path)?;
    let payload: UserPayload = parse_body(body, USER_RULES)?;

    state
        .users
        .update(user_id, payload.user_name.trim(), &payload.email)
        .await?;

    Ok(Json(OkResponse::ok()))
}

/// Delete a user and free their email (DELETE /v1/users/{user_id}).
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let user_id = parse_path(path)?;

    state.users.delete(user_id).await?;

    Ok(Json(OkResponse::ok()))
}
