use jsonwebtoken::{encode, EncodingKey, Header};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use board_shared::errors::AppError;
use board_shared::types::auth::{Claims, TokenPair};

use crate::config::AppConfig;

fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

pub fn create_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    sign(&Claims::new(user_id, email, ttl_secs), secret)
}

/// Only this digest is persisted, never the refresh token itself.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns the pair to hand out and the refresh-token hash to store.
pub fn create_token_pair(
    user_id: Uuid,
    email: &str,
    config: &AppConfig,
) -> Result<(TokenPair, String), AppError> {
    let access_token =
        create_token(user_id, email, &config.jwt_access_secret, config.jwt_access_ttl)?;
    let refresh_token =
        create_token(user_id, email, &config.jwt_refresh_secret, config.jwt_refresh_ttl)?;
    let refresh_hash = hash_token(&refresh_token);
    let pair = TokenPair::bearer(access_token, refresh_token, config.jwt_access_ttl);
    Ok((pair, refresh_hash))
}
