use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use board_shared::errors::AppResult;
use board_shared::types::auth::{AuthUser, RefreshUser, TokenPair};
use board_shared::types::ApiResponse;

use crate::services::auth_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 50, message = "nickname must be 1-50 characters"))]
    pub nickname: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<SignUpRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    req.nickname = req.nickname.trim().to_string();
    req.validate()?;
    let tokens = auth_service::sign_up(&state, &req.email, &req.nickname, &req.password).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    req.validate()?;
    let tokens = auth_service::sign_in(&state, &req.email, &req.password).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /auth/changePW, after the change-password code was confirmed.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    req.validate()?;
    let tokens = auth_service::change_password(&state, &req.email, &req.password).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

pub async fn delete_account(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<()>>> {
    auth_service::delete_user(&state, user.id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "회원 탈퇴가 완료되었습니다.")))
}

pub async fn refresh(
    user: RefreshUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let tokens = auth_service::refresh(&state, user.id, &user.refresh_token).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}
