use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::types::ApiErrorResponse;

/// Stable error codes returned in `error.code`.
///
/// `E0xxx` are infrastructure and request-shape failures, `E1xxx` belong to
/// accounts, verification and tokens, `E2xxx` to posts, comments and likes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    EmailDeliveryFailed,

    InvalidCredentials,
    EmailAlreadyExists,
    EmailNotVerified,
    TokenExpired,
    TokenInvalid,
    RefreshTokenRevoked,
    PasswordTooWeak,
    VerificationCodeExpired,
    VerificationCodeInvalid,
    VerificationAlreadySent,
    UserNotFound,

    PostNotFound,
    CommentNotFound,
    ReplyToReply,
}

impl ErrorCode {
    fn describe(self) -> (&'static str, StatusCode) {
        use StatusCode as S;
        match self {
            Self::InternalError => ("E0001", S::INTERNAL_SERVER_ERROR),
            Self::ValidationError => ("E0002", S::BAD_REQUEST),
            Self::NotFound => ("E0003", S::NOT_FOUND),
            Self::Unauthorized => ("E0004", S::UNAUTHORIZED),
            Self::EmailDeliveryFailed => ("E0005", S::BAD_GATEWAY),

            Self::InvalidCredentials => ("E1001", S::UNAUTHORIZED),
            Self::EmailAlreadyExists => ("E1002", S::CONFLICT),
            Self::EmailNotVerified => ("E1003", S::FORBIDDEN),
            Self::TokenExpired => ("E1004", S::UNAUTHORIZED),
            Self::TokenInvalid => ("E1005", S::UNAUTHORIZED),
            Self::RefreshTokenRevoked => ("E1006", S::UNAUTHORIZED),
            Self::PasswordTooWeak => ("E1007", S::BAD_REQUEST),
            Self::VerificationCodeExpired => ("E1008", S::BAD_REQUEST),
            Self::VerificationCodeInvalid => ("E1009", S::BAD_REQUEST),
            Self::VerificationAlreadySent => ("E1010", S::CONFLICT),
            Self::UserNotFound => ("E1011", S::NOT_FOUND),

            Self::PostNotFound => ("E2001", S::NOT_FOUND),
            Self::CommentNotFound => ("E2002", S::NOT_FOUND),
            Self::ReplyToReply => ("E2003", S::BAD_REQUEST),
        }
    }

    pub fn code(&self) -> &'static str {
        self.describe().0
    }

    pub fn status_code(&self) -> StatusCode {
        self.describe().1
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Failure of hashing, signing or the pool. The message is logged, never
    /// returned to the client.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Known { code, .. } => Some(*code),
            _ => None,
        }
    }

    fn to_response_parts(&self) -> (StatusCode, ApiErrorResponse) {
        let masked = |code: ErrorCode, message: &str| {
            (code.status_code(), ApiErrorResponse::new(code.code(), message))
        };

        match self {
            Self::Known { code: ErrorCode::InternalError, message, .. } => {
                tracing::error!(error = %message, "internal server error");
                masked(ErrorCode::InternalError, "internal server error")
            }
            Self::Known { code, message, details } => {
                let body = ApiErrorResponse::new(code.code(), message);
                let body = match details {
                    Some(d) => body.with_details(d.clone()),
                    None => body,
                };
                (code.status_code(), body)
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                masked(ErrorCode::InternalError, "internal server error")
            }
            Self::Database(diesel::result::Error::NotFound) => {
                masked(ErrorCode::NotFound, "resource not found")
            }
            Self::Database(err) => {
                tracing::error!(error = %err, "database error");
                masked(ErrorCode::InternalError, "database error")
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(errors.field_errors()).unwrap_or_default();
        Self::with_details(ErrorCode::ValidationError, "request validation failed", details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_response_parts();
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
