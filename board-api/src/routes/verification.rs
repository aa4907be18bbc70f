use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use board_shared::errors::AppResult;
use board_shared::types::ApiResponse;

use crate::models::{Verification, VerificationPurpose};
use crate::services::verification_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckCodeRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub code: i32,
}

async fn send_code(
    state: &AppState,
    req: SendCodeRequest,
    purpose: VerificationPurpose,
) -> AppResult<Json<ApiResponse<Verification>>> {
    req.validate()?;
    let verification = verification_service::request_code(state, &req.email, purpose).await?;
    Ok(Json(ApiResponse::ok(verification)))
}

async fn check_code(
    state: &AppState,
    req: CheckCodeRequest,
    purpose: VerificationPurpose,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    req.validate()?;
    let message = verification_service::check_code(state, &req.email, req.code, purpose).await?;
    Ok(Json(ApiResponse::ok(message)))
}

pub async fn send_signup_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendCodeRequest>,
) -> AppResult<Json<ApiResponse<Verification>>> {
    send_code(&state, req, VerificationPurpose::Signup).await
}

pub async fn check_signup_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckCodeRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    check_code(&state, req, VerificationPurpose::Signup).await
}

pub async fn send_password_change_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendCodeRequest>,
) -> AppResult<Json<ApiResponse<Verification>>> {
    send_code(&state, req, VerificationPurpose::PasswordChange).await
}

pub async fn check_password_change_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckCodeRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    check_code(&state, req, VerificationPurpose::PasswordChange).await
}
