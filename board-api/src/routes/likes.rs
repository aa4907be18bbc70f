use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use board_shared::errors::AppResult;
use board_shared::types::auth::AuthUser;
use board_shared::types::ApiResponse;

use crate::models::LikeToggle;
use crate::services::post_service;
use crate::AppState;

/// PUT /post/like/:postId toggles the caller's like on the post.
pub async fn like_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LikeToggle>>> {
    let toggle = post_service::like_post(&state, user.id, post_id).await?;
    Ok(Json(ApiResponse::ok(toggle)))
}
