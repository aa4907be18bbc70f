use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email send failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email API error: {0}")]
    Rejected(String),
}

/// Outbound mail collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Client for a Resend-compatible HTTP email API.
#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    api_url: String,
    api_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: String,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
}

impl EmailClient {
    pub fn new(api_url: &str, api_key: &str, from_email: &str, from_name: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for EmailClient {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let request = SendRequest {
            from: format!("{} <{}>", self.from_name, self.from_email),
            to: vec![to],
            subject,
            text: body,
        };

        let response = self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(body));
        }

        tracing::debug!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Keeps every message in memory instead of delivering it. Can be switched
/// to reject all sends.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<SentMail>>>,
    failing: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<SentMail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Rejected("mailer configured to fail".into()));
        }
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        mailer.send_mail("a@x.com", "hello", "body").await.unwrap();

        let last = mailer.last_to("a@x.com").unwrap();
        assert_eq!(last.subject, "hello");
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn failing_mailer_rejects() {
        let mailer = MemoryMailer::failing();
        assert!(mailer.send_mail("a@x.com", "s", "b").await.is_err());
        assert!(mailer.sent().is_empty());
    }
}
