use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::payments::{
    CheckoutSessionLink, CreditPackage, StripeCheckoutSession, StripeEvent,
};

#[async_trait]
#[automock]
pub trait StripeGateway {
    async fn create_credit_checkout_session(
        &self,
        package: &CreditPackage,
        user_id: Uuid,
        customer_email: &str,
    ) -> Result<CheckoutSessionLink>;

    /// Retrieves a Checkout Session with its line items expanded.
    async fn retrieve_checkout_session(&self, session_id: &str)
        -> Result<StripeCheckoutSession>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<StripeEvent>;

    /// Resolves the Checkout Session a charge belongs to, for refund events
    /// that only carry a payment intent.
    async fn find_session_id_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Option<String>>;
}
