use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthUser, Claims, RefreshUser};

/// Signing secrets the extractors verify against. Implemented by the
/// application state.
pub trait JwtSecrets {
    fn access_secret(&self) -> &str;
    fn refresh_secret(&self) -> &str;
}

impl<T: JwtSecrets> JwtSecrets for Arc<T> {
    fn access_secret(&self) -> &str {
        (**self).access_secret()
    }

    fn refresh_secret(&self) -> &str {
        (**self).refresh_secret()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: JwtSecrets + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (claims, _) = authenticate(&parts.headers, state.access_secret())?;
        Ok(AuthUser::from(claims))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RefreshUser
where
    S: JwtSecrets + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (claims, token) = authenticate(&parts.headers, state.refresh_secret())?;
        Ok(RefreshUser {
            id: claims.sub,
            email: claims.email,
            refresh_token: token,
        })
    }
}

/// Parses the bearer token out of `headers` and verifies it against `secret`.
/// Returns the claims along with the raw token.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<(Claims, String), AppError> {
    let token = extract_bearer_token(headers)?;
    let claims = decode_claims(&token, secret)?;

    if claims.is_expired() {
        return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
    }

    Ok((claims, token))
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "authorization header must use Bearer scheme"))?;

    Ok(token.trim().to_string())
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::new(ErrorCode::TokenExpired, "token has expired")
        }
        _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn accepts_token_signed_with_matching_secret() {
        let claims = Claims::new(Uuid::now_v7(), "a@x.com", 60);
        let token = sign(&claims, "access");

        let (decoded, raw) = authenticate(&bearer(&token), "access").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(raw, token);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = sign(&Claims::new(Uuid::now_v7(), "a@x.com", 60), "refresh");
        let err = authenticate(&bearer(&token), "access").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TokenInvalid));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign(&Claims::new(Uuid::now_v7(), "a@x.com", -120), "access");
        let err = authenticate(&bearer(&token), "access").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TokenExpired));
    }

    #[test]
    fn missing_or_non_bearer_header_is_unauthorized() {
        let err = authenticate(&HeaderMap::new(), "access").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Unauthorized));

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        let err = authenticate(&headers, "access").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    }
}
