use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use board_shared::errors::AppResult;
use board_shared::types::auth::AuthUser;
use board_shared::types::ApiResponse;

use crate::models::Comment;
use crate::services::post_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    /// Parent comment; absent or null for a top-level comment.
    #[serde(default)]
    pub reply: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub comment_id: Uuid,
}

pub async fn create_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    req.validate()?;
    let comment =
        post_service::create_comment(&state, user.id, req.post_id, &req.content, req.reply).await?;
    Ok(Json(ApiResponse::ok(comment)))
}

pub async fn delete_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteCommentRequest>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    let comment = post_service::delete_comment(&state, user.id, req.comment_id).await?;
    Ok(Json(ApiResponse::ok(comment)))
}
