use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use tracing::error;

use crate::domain::repositories::email::EmailSender;
use crate::domain::value_objects::email::EmailMessage;

/// Transactional email via the Resend HTTP API.
/// https://resend.com/docs/api-reference/emails/send-email
pub struct ResendClient {
    http: reqwest::Client,
    api_key: String,
    from_address: String,
}

impl ResendClient {
    pub fn new(api_key: String, from_address: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from_address,
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let body = json!({
            "from": self.from_address,
            "to": [message.to],
            "subject": message.subject,
            "html": message.html,
        });

        let resp = self
            .http
            .post("https://api.resend.com/emails")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(
                status = %status,
                response_body = %body,
                "resend api request failed"
            );
            anyhow::bail!("Resend API request failed (status {})", status);
        }

        Ok(())
    }
}
