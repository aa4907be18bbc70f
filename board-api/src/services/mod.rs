pub mod auth_service;
pub mod post_service;
pub mod token_service;
pub mod verification_service;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use board_shared::clients::email::MemoryMailer;

    use crate::config::AppConfig;
    use crate::models::VerificationPurpose;
    use crate::repositories::MemoryStore;
    use crate::services::verification_service;
    use crate::AppState;

    pub struct Harness {
        pub state: AppState,
        pub store: MemoryStore,
        pub mailer: MemoryMailer,
    }

    pub fn harness() -> Harness {
        harness_with_mailer(MemoryMailer::new())
    }

    pub fn harness_with_mailer(mailer: MemoryMailer) -> Harness {
        let store = MemoryStore::new();
        let state = AppState::new(AppConfig::default(), store.clone(), Arc::new(mailer.clone()));
        Harness { state, store, mailer }
    }

    /// Code from the last mail sent to `email`.
    pub fn sent_code(h: &Harness, email: &str) -> i32 {
        let mail = h.mailer.last_to(email).expect("no mail sent");
        mail.body
            .trim_start_matches("인증 코드: ")
            .parse()
            .expect("mail body carries a code")
    }

    /// Runs the request/check round so `email` holds a confirmed record.
    pub async fn verified_code(h: &Harness, email: &str, purpose: VerificationPurpose) {
        verification_service::request_code(&h.state, email, purpose)
            .await
            .unwrap();
        let code = sent_code(h, email);
        verification_service::check_code(&h.state, email, code, purpose)
            .await
            .unwrap();
    }
}
