//! Outbound email delivery.
//!
//! Registration stores a pending user and then calls the notifier
//! explicitly, in sequence. The notifier is constructed once at startup and
//! handed to the handlers through `AppState`.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::DomainError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification_email(&self, address: &str, code: &str)
        -> Result<(), DomainError>;
}

const MAILERSEND_API_URL: &str = "https://api.mailersend.com/v1/email";

/// Delivers verification codes through the MailerSend HTTP API.
pub struct MailerSendNotifier {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl MailerSendNotifier {
    pub fn new(api_key: impl Into<String>) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| DomainError::External(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            api_url: MAILERSEND_API_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl Notifier for MailerSendNotifier {
    async fn send_verification_email(
        &self,
        address: &str,
        code: &str,
    ) -> Result<(), DomainError> {
        let body = json!({
            "from": {
                "email": "no-reply@critiq.ovh",
                "name": "Critiq"
            },
            "to": [{ "email": address }],
            "subject": "Verification code",
            "text": format!("Your verification code is: {}", code)
        });

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::External(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(DomainError::External(format!(
                "MailerSend returned {}: {}",
                status, detail
            )));
        }

        Ok(())
    }
}

/// Fallback used when no MAILERSEND_API_KEY is configured: logs the code
/// instead of delivering it. Only useful for local development.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification_email(
        &self,
        address: &str,
        code: &str,
    ) -> Result<(), DomainError> {
        tracing::info!("verification code for {}: {}", address, code);
        Ok(())
    }
}
