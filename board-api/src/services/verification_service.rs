use chrono::Utc;
use uuid::Uuid;

use board_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewVerification, Verification, VerificationPurpose};
use crate::services::auth_service::{generate_verification_code, normalize_email};
use crate::AppState;

pub const CONFIRMATION_MESSAGE: &str = "인증이 완료되었습니다.";

fn compose_mail(purpose: VerificationPurpose, code: i32) -> (&'static str, String) {
    let subject = match purpose {
        VerificationPurpose::Signup => "[BE-STUDY] 이메일 인증 코드입니다.",
        VerificationPurpose::PasswordChange => "[BE-STUDY] 비밀번호 변경을 위한 이메일 인증 코드입니다.",
    };
    (subject, format!("인증 코드: {code}"))
}

/// Sends a fresh code and records it as pending.
///
/// Account checks run first and never touch stored codes. A pending record
/// that outlived `verification_code_ttl` is then replaced; a live one rejects
/// the request. The mail goes out before anything is stored, so a delivery
/// failure leaves no record behind.
pub async fn request_code(
    state: &AppState,
    email: &str,
    purpose: VerificationPurpose,
) -> AppResult<Verification> {
    let email = normalize_email(email);

    let account = state.users.find_by_email(&email).await?;
    match purpose {
        VerificationPurpose::Signup if account.is_some() => {
            return Err(AppError::new(ErrorCode::EmailAlreadyExists, "이미 가입된 이메일입니다."));
        }
        VerificationPurpose::PasswordChange if account.is_none() => {
            return Err(AppError::new(ErrorCode::UserNotFound, "존재하지 않는 유저입니다."));
        }
        _ => {}
    }

    if let Some(existing) = state.verifications.find(&email, purpose).await? {
        if !existing.is_expired(state.config.verification_code_ttl, Utc::now()) {
            return Err(AppError::new(ErrorCode::VerificationAlreadySent, "이미 코드가 전송되었습니다."));
        }
        tracing::debug!(email = %email, purpose = %purpose, "replacing expired verification");
        state.verifications.delete(&email, purpose).await?;
    }

    let code = generate_verification_code();
    let (subject, body) = compose_mail(purpose, code);
    state
        .mailer
        .send_mail(&email, subject, &body)
        .await
        .map_err(|e| {
            tracing::error!(email = %email, error = %e, "verification mail failed");
            AppError::new(ErrorCode::EmailDeliveryFailed, "인증 메일 전송에 실패했습니다.")
        })?;

    let verification = state
        .verifications
        .create(NewVerification {
            id: Uuid::now_v7(),
            email: email.clone(),
            purpose: purpose.as_str().to_string(),
            code,
        })
        .await?;

    tracing::info!(email = %email, purpose = %purpose, "verification code sent");
    Ok(verification)
}

pub async fn check_code(
    state: &AppState,
    email: &str,
    code: i32,
    purpose: VerificationPurpose,
) -> AppResult<&'static str> {
    let email = normalize_email(email);

    let verification = state
        .verifications
        .find_matching(&email, code, purpose)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::VerificationCodeInvalid, "잘못된 인증 코드입니다."))?;

    if verification.is_expired(state.config.verification_code_ttl, Utc::now()) {
        return Err(AppError::new(ErrorCode::VerificationCodeExpired, "인증 코드가 만료되었습니다."));
    }

    state.verifications.mark_verified(verification.id).await?;

    tracing::info!(email = %email, purpose = %purpose, "verification confirmed");
    Ok(CONFIRMATION_MESSAGE)
}

/// Fails with `EmailNotVerified` unless a confirmed record exists.
pub async fn require_verified(
    state: &AppState,
    email: &str,
    purpose: VerificationPurpose,
) -> AppResult<Verification> {
    state
        .verifications
        .find(email, purpose)
        .await?
        .filter(|v| v.verified)
        .ok_or_else(|| AppError::new(ErrorCode::EmailNotVerified, "이메일 인증을 먼저 진행해주세요."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{harness, harness_with_mailer, sent_code};
    use board_shared::clients::email::MemoryMailer;

    #[tokio::test]
    async fn request_code_mails_six_digit_code() {
        let h = harness();
        let verification = request_code(&h.state, "A@x.com", VerificationPurpose::Signup)
            .await
            .unwrap();

        assert_eq!(verification.email, "a@x.com");
        assert!(!verification.verified);

        let mail = h.mailer.last_to("a@x.com").unwrap();
        assert_eq!(mail.subject, "[BE-STUDY] 이메일 인증 코드입니다.");
        assert_eq!(sent_code(&h, "a@x.com"), verification.code);
    }

    #[tokio::test]
    async fn second_request_while_pending_is_rejected() {
        let h = harness();
        request_code(&h.state, "a@x.com", VerificationPurpose::Signup).await.unwrap();

        let err = request_code(&h.state, "a@x.com", VerificationPurpose::Signup)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::VerificationAlreadySent));
        assert_eq!(h.mailer.sent().len(), 1);

        // a different purpose is tracked separately
        let err = request_code(&h.state, "a@x.com", VerificationPurpose::PasswordChange)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UserNotFound));
    }

    #[tokio::test]
    async fn expired_pending_code_is_replaced() {
        let h = harness();
        let first = request_code(&h.state, "a@x.com", VerificationPurpose::Signup).await.unwrap();
        h.store
            .backdate_verification(first.id, Utc::now() - chrono::Duration::hours(1))
            .await;

        let second = request_code(&h.state, "a@x.com", VerificationPurpose::Signup).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(h.mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn registered_email_keeps_expired_record() {
        let h = harness();
        let stale = h
            .state
            .verifications
            .create(NewVerification {
                id: Uuid::now_v7(),
                email: "a@x.com".into(),
                purpose: VerificationPurpose::Signup.as_str().into(),
                code: 123_456,
            })
            .await
            .unwrap();
        h.store
            .backdate_verification(stale.id, Utc::now() - chrono::Duration::hours(1))
            .await;
        h.state
            .users
            .create(crate::models::NewUser {
                id: Uuid::now_v7(),
                email: "a@x.com".into(),
                nickname: "a".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        let err = request_code(&h.state, "a@x.com", VerificationPurpose::Signup)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmailAlreadyExists));

        let kept = h
            .state
            .verifications
            .find("a@x.com", VerificationPurpose::Signup)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.id, stale.id);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn mail_failure_persists_nothing() {
        let h = harness_with_mailer(MemoryMailer::failing());
        let err = request_code(&h.state, "a@x.com", VerificationPurpose::Signup)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmailDeliveryFailed));
        assert!(h
            .state
            .verifications
            .find("a@x.com", VerificationPurpose::Signup)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn check_code_marks_verified() {
        let h = harness();
        request_code(&h.state, "a@x.com", VerificationPurpose::Signup).await.unwrap();
        let code = sent_code(&h, "a@x.com");

        let wrong = if code == 999_999 { 100_000 } else { code + 1 };
        let err = check_code(&h.state, "a@x.com", wrong, VerificationPurpose::Signup)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeInvalid));

        // right code, wrong purpose
        let err = check_code(&h.state, "a@x.com", code, VerificationPurpose::PasswordChange)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeInvalid));

        let message = check_code(&h.state, "a@x.com", code, VerificationPurpose::Signup)
            .await
            .unwrap();
        assert_eq!(message, CONFIRMATION_MESSAGE);
        assert!(require_verified(&h.state, "a@x.com", VerificationPurpose::Signup).await.is_ok());
    }

    #[tokio::test]
    async fn check_code_rejects_expired_code() {
        let h = harness();
        let v = request_code(&h.state, "a@x.com", VerificationPurpose::Signup).await.unwrap();
        h.store
            .backdate_verification(v.id, Utc::now() - chrono::Duration::hours(1))
            .await;

        let err = check_code(&h.state, "a@x.com", v.code, VerificationPurpose::Signup)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeExpired));
    }

    #[tokio::test]
    async fn pending_record_is_not_verified() {
        let h = harness();
        request_code(&h.state, "a@x.com", VerificationPurpose::Signup).await.unwrap();
        let err = require_verified(&h.state, "a@x.com", VerificationPurpose::Signup)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmailNotVerified));
    }
}
