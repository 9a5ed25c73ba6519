//! Micropost CRUD handlers, nested under a user.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;

use postboard_core::board::MICROPOST_RULES;
use postboard_core::storage::RepositoryError;

use crate::{
    handlers::{parse_body, parse_path, ApiError},
    models::{MicropostPayload, MicropostResponse, MicropostsResponse, OkResponse},
    state::AppState,
};

/// List a user's microposts (GET /v1/users/{user_id}/microposts).
pub async fn list_microposts(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<MicropostsResponse>, ApiError> {
    let user_id = parse_path(path)?;
    let posts = state.microposts.list_by_user(user_id).await?;

    Ok(Json(MicropostsResponse {
        microposts: posts.into_iter().map(MicropostResponse::from).collect(),
    }))
}

/// Create a micropost (POST /v1/users/{user_id}/microposts).
pub async fn create_micropost(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    let user_id = parse_path(path)?;
    let payload: MicropostPayload = parse_body(body, MICROPOST_RULES)?;

    let post = state.microposts.create(user_id, &payload.content).await?;

    Ok((StatusCode::CREATED, Json(OkResponse::created(post.id))))
}

/// Get one micropost (GET /v1/users/{user_id}/microposts/{micropost_id}).
pub async fn get_micropost(
    State(state): State<AppState>,
    path: Result<Path<(u64, u64)>, PathRejection>,
) -> Result<Json<MicropostResponse>, ApiError> {
    let (user_id, micropost_id) = parse_path(path)?;

    match state.microposts.get(user_id, micropost_id).await? {
        Some(post) => Ok(Json(post.into())),
        None => Err(ApiError::Repository(RepositoryError::NotFound {
            entity_type: "Micropost",
            id: micropost_id.to_string(),
        })),
    }
}

/// Replace a micropost's content (PUT /v1/users/{user_id}/microposts/{micropost_id}).
pub async fn update_micropost(
    State(state): State<AppState>,
    path: Result<Path<(u64, u64)>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let (user_id, micropost_id) = parse_path(path)?;
    let payload: MicropostPayload = parse_body(body, MICROPOST_RULES)?;

    state
        .microposts
        .update(user_id, micropost_id, &payload.content)
        .await?;

    Ok(Json(OkResponse::ok()))
}

/// Delete a micropost (DELETE /v1/users/{user_id}/microposts/{micropost_id}).
pub async fn delete_micropost(
    State(state): State<AppState>,
    path: Result<Path<(u64, u64)>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let (user_id, micropost_id) = parse_path(path)?;

    state.microposts.delete(user_id, micropost_id).await?;

    Ok(Json(OkResponse::ok()))
}
