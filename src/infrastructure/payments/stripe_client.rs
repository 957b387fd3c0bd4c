use anyhow::Result;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

use crate::domain::repositories::payments::StripeGateway;
use crate::domain::value_objects::payments::{
    CheckoutSessionLink, CreditPackage, StripeCheckoutSession, StripeEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

impl StripeClient {
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
            success_url,
            cancel_url,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .or_else(|| resp.headers().get("stripe-request-id"))
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (stripe_error_type, stripe_error_code, stripe_error_param, stripe_error_message) =
            match serde_json::from_str::<StripeErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (details.type_, details.code, details.param, details.message)
                }
                Err(_) => (None, None, None, None),
            };

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?stripe_error_type,
            stripe_error_code = ?stripe_error_code,
            stripe_error_param = ?stripe_error_param,
            stripe_error_message = ?stripe_error_message,
            response_body = %body,
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }
}

#[async_trait]
impl StripeGateway for StripeClient {
    /// Creates a payment-mode Checkout Session for a credit package. The
    /// package is priced inline via `price_data`, so nothing has to exist in
    /// the Stripe dashboard. https://stripe.com/docs/payments/checkout
    async fn create_credit_checkout_session(
        &self,
        package: &CreditPackage,
        user_id: Uuid,
        customer_email: &str,
    ) -> Result<CheckoutSessionLink> {
        let body: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                "usd".to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                package.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                package.name.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("customer_email".to_string(), customer_email.to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("metadata[kind]".to_string(), "credits".to_string()),
            ("metadata[user_id]".to_string(), user_id.to_string()),
            ("metadata[package_id]".to_string(), package.id.to_string()),
            ("metadata[credits]".to_string(), package.credits.to_string()),
        ];

        let resp = self
            .http
            .post("https://api.stripe.com/v1/checkout/sessions")
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            id: String,
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        let url = parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))?;

        Ok(CheckoutSessionLink {
            id: parsed.id,
            url,
        })
    }

    /// https://stripe.com/docs/api/checkout/sessions/retrieve
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<StripeCheckoutSession> {
        let resp = self
            .http
            .get(format!(
                "https://api.stripe.com/v1/checkout/sessions/{}",
                session_id
            ))
            .query(&[("expand[]", "line_items")])
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve checkout session").await?;

        let session: StripeCheckoutSession = resp.json().await?;
        Ok(session)
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> Result<StripeEvent> {
        let mut timestamp: Option<String> = None;
        let mut signature: Option<String> = None;

        for part in signature_header.split(',') {
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest.to_string());
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signature = Some(rest.to_string());
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow::anyhow!("missing timestamp in stripe-signature"))?;
        let signature =
            signature.ok_or_else(|| anyhow::anyhow!("missing v1 in stripe-signature"))?;

        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();
        let provided = hex::decode(signature)?;

        if expected[..] != provided[..] {
            anyhow::bail!("invalid webhook signature");
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }

    /// Charges only carry a payment intent; the owning Checkout Session is
    /// found by filtering the session list.
    /// https://stripe.com/docs/api/checkout/sessions/list
    async fn find_session_id_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Option<String>> {
        let resp = self
            .http
            .get("https://api.stripe.com/v1/checkout/sessions")
            .query(&[("payment_intent", payment_intent), ("limit", "1")])
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "list checkout sessions by payment intent").await?;

        #[derive(Deserialize)]
        struct SessionList {
            data: Vec<SessionRef>,
        }

        #[derive(Deserialize)]
        struct SessionRef {
            id: String,
        }

        let parsed: SessionList = resp.json().await?;
        Ok(parsed.data.into_iter().next().map(|session| session.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> StripeClient {
        StripeClient::new(
            "sk_test_xxx".to_string(),
            "whsec_test123secret456".to_string(),
            "https://example.com/success".to_string(),
            "https://example.com/cancel".to_string(),
        )
    }

    fn sign(payload: &[u8], secret: &str, timestamp: &str) -> String {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_webhook_signature() {
        let client = test_client();
        let payload = br#"{"type":"checkout.session.completed","data":{"object":{}}}"#;
        let timestamp = "1700000000";
        let signature = sign(payload, "whsec_test123secret456", timestamp);
        let header = format!("t={},v1={}", timestamp, signature);

        let event = client.verify_webhook_signature(payload, &header).unwrap();
        assert_eq!(event.type_, "checkout.session.completed");
    }

    #[test]
    fn rejects_tampered_payload() {
        let client = test_client();
        let payload = br#"{"type":"checkout.session.completed","data":{"object":{}}}"#;
        let tampered = br#"{"type":"checkout.session.completed","data":{"object":{"a":1}}}"#;
        let timestamp = "1700000000";
        let signature = sign(payload, "whsec_test123secret456", timestamp);
        let header = format!("t={},v1={}", timestamp, signature);

        assert!(client.verify_webhook_signature(tampered, &header).is_err());
    }

    #[test]
    fn rejects_signature_from_wrong_secret() {
        let client = test_client();
        let payload = br#"{"type":"charge.refunded","data":{"object":{}}}"#;
        let timestamp = "1700000000";
        let signature = sign(payload, "wrong_secret", timestamp);
        let header = format!("t={},v1={}", timestamp, signature);

        assert!(client.verify_webhook_signature(payload, &header).is_err());
    }

    #[test]
    fn rejects_malformed_signature_header() {
        let client = test_client();
        let payload = br#"{"type":"charge.refunded","data":{"object":{}}}"#;

        assert!(client.verify_webhook_signature(payload, "v1=deadbeef").is_err());
        assert!(client.verify_webhook_signature(payload, "t=123").is_err());
    }
}
