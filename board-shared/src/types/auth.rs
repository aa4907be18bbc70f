use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload shared by access and refresh tokens. The two kinds differ only
/// in signing secret and lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, email: impl Into<String>, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            email: email.into(),
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Caller identity taken from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            token_id: claims.jti,
        }
    }
}

/// Caller identity taken from a verified refresh token, together with the raw
/// token so it can be compared against the one stored for the user.
#[derive(Debug, Clone)]
pub struct RefreshUser {
    pub id: Uuid,
    pub email: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    /// `expires_in` is the access token's lifetime in seconds.
    pub fn bearer(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self { token_type: "Bearer".into(), access_token, refresh_token, expires_in }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_expire_after_duration() {
        let claims = Claims::new(Uuid::now_v7(), "a@x.com", 3600);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());

        let stale = Claims::new(Uuid::now_v7(), "a@x.com", -10);
        assert!(stale.is_expired());
    }

    #[test]
    fn every_claim_gets_its_own_jti() {
        let id = Uuid::now_v7();
        let a = Claims::new(id, "a@x.com", 60);
        let b = Claims::new(id, "a@x.com", 60);
        assert_ne!(a.jti, b.jti);
    }
}
