use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use uuid::Uuid;

use board_shared::errors::{AppError, AppResult, ErrorCode};
use board_shared::types::auth::TokenPair;

use crate::models::{NewUser, User, VerificationPurpose};
use crate::services::{token_service, verification_service};
use crate::AppState;

const PASSWORD_SPECIALS: &str = "@$!%*#?&";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// At least 8 characters drawn from letters, digits and `@$!%*#?&`, with at
/// least one of each class.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    let allowed_only = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if password.chars().count() < 8 || !allowed_only || !has_letter || !has_digit || !has_special {
        return Err(AppError::new(
            ErrorCode::PasswordTooWeak,
            "비밀번호는 영문, 숫자, 특수문자로 이루어져야 합니다.",
        ));
    }
    Ok(())
}

pub fn generate_verification_code() -> i32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issues a fresh pair and replaces the stored refresh-token hash, which
/// invalidates any refresh token handed out before.
async fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenPair> {
    let (token_pair, refresh_hash) =
        token_service::create_token_pair(user.id, &user.email, &state.config)?;
    state.users.update_refresh_token(user.id, Some(&refresh_hash)).await?;
    Ok(token_pair)
}

pub async fn sign_up(
    state: &AppState,
    email: &str,
    nickname: &str,
    password: &str,
) -> AppResult<TokenPair> {
    let email = normalize_email(email);
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "닉네임을 입력해주세요."));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "이미 가입되어 있는 이메일입니다."));
    }
    verification_service::require_verified(state, &email, VerificationPurpose::Signup).await?;
    validate_password(password)?;

    let password_hash = hash_password(password)?;
    let user = state
        .users
        .create(NewUser {
            id: Uuid::now_v7(),
            email: email.clone(),
            nickname: nickname.to_string(),
            password_hash,
        })
        .await?;

    state.verifications.delete(&email, VerificationPurpose::Signup).await?;

    let token_pair = issue_tokens(state, &user).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(token_pair)
}

pub async fn sign_in(state: &AppState, email: &str, password: &str) -> AppResult<TokenPair> {
    let email = normalize_email(email);

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "존재하지 않는 유저입니다."))?;

    if !verify_password(password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "sign-in with wrong password");
        return Err(AppError::new(ErrorCode::InvalidCredentials, "비밀번호가 올바르지 않습니다."));
    }

    let token_pair = issue_tokens(state, &user).await?;

    tracing::info!(user_id = %user.id, "user signed in");
    Ok(token_pair)
}

pub async fn change_password(
    state: &AppState,
    email: &str,
    new_password: &str,
) -> AppResult<TokenPair> {
    let email = normalize_email(email);

    verification_service::require_verified(state, &email, VerificationPurpose::PasswordChange).await?;
    validate_password(new_password)?;

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "존재하지 않는 유저입니다."))?;

    let password_hash = hash_password(new_password)?;
    state.users.update_password(user.id, &password_hash).await?;
    state
        .verifications
        .delete(&email, VerificationPurpose::PasswordChange)
        .await?;

    let token_pair = issue_tokens(state, &user).await?;

    tracing::info!(user_id = %user.id, "password changed");
    Ok(token_pair)
}

pub async fn refresh(
    state: &AppState,
    user_id: Uuid,
    presented_refresh_token: &str,
) -> AppResult<TokenPair> {
    let revoked = || AppError::new(ErrorCode::RefreshTokenRevoked, "invalid refresh token");

    let user = state.users.find_by_id(user_id).await?.ok_or_else(revoked)?;

    let presented_hash = token_service::hash_token(presented_refresh_token);
    if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
        tracing::warn!(user_id = %user_id, "stale or foreign refresh token presented");
        return Err(revoked());
    }

    let token_pair = issue_tokens(state, &user).await?;

    tracing::info!(user_id = %user.id, "token refreshed");
    Ok(token_pair)
}

pub async fn delete_user(state: &AppState, user_id: Uuid) -> AppResult<()> {
    if !state.users.delete(user_id).await? {
        return Err(AppError::new(ErrorCode::UserNotFound, "존재하지 않는 유저입니다."));
    }
    tracing::info!(user_id = %user_id, "user deleted");
    Ok(())
}
