use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::config_model::{App as AppConfig, Stripe as StripeConfig};
use crate::domain::{
    entities::{orders::InsertOrderEntity, profiles::{InsertProfileEntity, ProfileEntity}},
    repositories::{
        email::EmailSender, orders::OrderRepository, payments::StripeGateway,
        profiles::ProfileRepository, transactions::TransactionRepository,
    },
    value_objects::{
        email::EmailMessage,
        enums::{
            order_statuses::{OrderAction, OrderStatus},
            order_tiers::OrderTier,
            transaction_statuses::TransactionStatus,
        },
        orders::generate_view_token,
        payments::{StripeCheckoutSession, StripeEvent},
    },
};

#[derive(Debug, Error)]
pub enum StripeWebhookError {
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StripeWebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            StripeWebhookError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            StripeWebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type StripeWebhookResult<T> = std::result::Result<T, StripeWebhookError>;

/// Settles payment events: credit purchases top up balances, gift purchases
/// materialize orders, refunds claw credits back.
pub struct StripeWebhookUseCase<O, P, T, S, E>
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
    E: EmailSender + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    profile_repo: Arc<P>,
    transaction_repo: Arc<T>,
    stripe_client: Arc<S>,
    email_client: Arc<E>,
    stripe_config: StripeConfig,
    app_config: AppConfig,
}

impl<O, P, T, S, E> StripeWebhookUseCase<O, P, T, S, E>
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
    E: EmailSender + Send + Sync + 'static,
{
    pub fn new(
        order_repo: Arc<O>,
        profile_repo: Arc<P>,
        transaction_repo: Arc<T>,
        stripe_client: Arc<S>,
        email_client: Arc<E>,
        stripe_config: StripeConfig,
        app_config: AppConfig,
    ) -> Self {
        Self {
            order_repo,
            profile_repo,
            transaction_repo,
            stripe_client,
            email_client,
            stripe_config,
            app_config,
        }
    }

    pub async fn handle(&self, payload: &[u8], signature: &str) -> StripeWebhookResult<()> {
        let event = self
            .stripe_client
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "stripe webhook: signature verification failed");
                StripeWebhookError::InvalidWebhook("signature verification failed".into())
            })?;

        info!(event_type = %event.type_, "stripe webhook: event verified");

        match event.type_.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(&event).await?,
            "checkout.session.expired" | "checkout.session.async_payment_failed" => {
                self.handle_checkout_failed(&event).await?
            }
            "charge.refunded" => self.handle_charge_refunded(&event).await?,
            other => {
                debug!(event_type = other, "stripe webhook: unhandled event type");
            }
        }

        Ok(())
    }

    fn extract_session(event: &StripeEvent) -> StripeWebhookResult<StripeCheckoutSession> {
        serde_json::from_value(event.data.object.clone()).map_err(|err| {
            warn!(error = %err, "stripe webhook: malformed checkout session object");
            StripeWebhookError::InvalidWebhook("malformed checkout session".into())
        })
    }

    async fn handle_checkout_completed(&self, event: &StripeEvent) -> StripeWebhookResult<()> {
        let session = Self::extract_session(event)?;

        if session.metadata_value("kind") == Some("credits") {
            self.handle_credits_purchase(&session).await
        } else {
            self.handle_gift_purchase(&session).await
        }
    }

    async fn handle_credits_purchase(
        &self,
        session: &StripeCheckoutSession,
    ) -> StripeWebhookResult<()> {
        let session_id = session
            .id
            .as_deref()
            .ok_or_else(|| StripeWebhookError::InvalidWebhook("missing session id".into()))?;

        let user_id = session
            .metadata_value("user_id")
            .and_then(|value| uuid::Uuid::parse_str(value).ok())
            .ok_or_else(|| StripeWebhookError::InvalidWebhook("missing user_id".into()))?;
        let credits = session
            .metadata_value("credits")
            .and_then(|value| value.parse::<i32>().ok())
            .ok_or_else(|| StripeWebhookError::InvalidWebhook("missing credits".into()))?;

        // A replayed event finds the transaction already settled and stops
        // before touching the balance again.
        let transaction = self
            .transaction_repo
            .find_by_checkout_session_id(session_id)
            .await
            .map_err(|err| {
                error!(session_id, db_error = ?err, "stripe webhook: transaction lookup failed");
                StripeWebhookError::Internal(err)
            })?;

        if let Some(transaction) = transaction.as_ref() {
            if transaction.status == TransactionStatus::Completed.to_string() {
                info!(session_id, "stripe webhook: transaction already completed, ignoring replay");
                return Ok(());
            }
        }

        self.transaction_repo
            .update_status_by_checkout_session_id(session_id, TransactionStatus::Completed)
            .await
            .map_err(|err| {
                error!(session_id, db_error = ?err, "stripe webhook: failed to complete transaction");
                StripeWebhookError::Internal(err)
            })?;

        self.profile_repo
            .add_credits(user_id, credits)
            .await
            .map_err(|err| {
                error!(
                    session_id,
                    %user_id,
                    credits,
                    db_error = ?err,
                    "stripe webhook: failed to credit balance"
                );
                StripeWebhookError::Internal(err)
            })?;

        if let Some(customer) = session.customer.as_deref() {
            if let Err(err) = self
                .profile_repo
                .set_stripe_customer_id(user_id, customer)
                .await
            {
                warn!(
                    %user_id,
                    customer,
                    error = ?err,
                    "stripe webhook: failed to store stripe customer id"
                );
            }
        }

        info!(session_id, %user_id, credits, "stripe webhook: credits purchase settled");
        Ok(())
    }

    async fn handle_gift_purchase(
        &self,
        session: &StripeCheckoutSession,
    ) -> StripeWebhookResult<()> {
        let session_id = session
            .id
            .as_deref()
            .ok_or_else(|| StripeWebhookError::InvalidWebhook("missing session id".into()))?;

        let email = session
            .customer_email()
            .ok_or_else(|| StripeWebhookError::InvalidWebhook("missing customer email".into()))?
            .to_lowercase();

        let profile = self.resolve_profile(&email).await?;

        let tier = session
            .metadata_value("tier")
            .and_then(OrderTier::from_str)
            .or_else(|| {
                session
                    .first_price_id()
                    .and_then(|price_id| self.stripe_config.tier_for_price_id(price_id))
                    .and_then(OrderTier::from_str)
            })
            .unwrap_or_else(|| {
                warn!(session_id, "stripe webhook: unable to resolve tier, defaulting to standard");
                OrderTier::Standard
            });

        let status = OrderStatus::Pending
            .transition(&OrderAction::CheckoutCompleted)
            .unwrap_or(OrderStatus::PendingInterview);

        let now = Utc::now();
        let order = self
            .order_repo
            .upsert_by_checkout_session(InsertOrderEntity {
                user_id: Some(profile.id),
                tier: tier.to_string(),
                status: status.to_string(),
                quiz_data: None,
                interview_data: None,
                stripe_checkout_session_id: Some(session_id.to_string()),
                view_token: generate_view_token(),
                recipient_name: session.metadata_value("recipient_name").map(str::to_string),
                recipient_email: session
                    .metadata_value("recipient_email")
                    .map(str::to_string),
                amount_paid: session.amount_total.and_then(|v| i32::try_from(v).ok()),
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|err| {
                error!(session_id, db_error = ?err, "stripe webhook: order upsert failed");
                StripeWebhookError::Internal(err)
            })?;

        // The upsert may have returned an order created earlier by the claim
        // fallback; only an unowned row gets the buyer attached.
        if order.user_id.is_none() {
            self.order_repo
                .set_owner(order.id, profile.id)
                .await
                .map_err(|err| {
                    error!(order_id = %order.id, db_error = ?err, "stripe webhook: failed to set owner");
                    StripeWebhookError::Internal(err)
                })?;
        }

        let confirmation = EmailMessage {
            to: email.clone(),
            subject: "Your Gifting Moments order is confirmed".to_string(),
            html: format!(
                "<p>Thank you for your order! Start the interview whenever you are ready: \
                 <a href=\"{}/orders/{}/interview\">continue your order</a>.</p>",
                self.app_config.base_url.trim_end_matches('/'),
                order.id
            ),
        };
        if let Err(err) = self.email_client.send(confirmation).await {
            warn!(order_id = %order.id, error = ?err, "stripe webhook: confirmation email failed");
        }

        info!(
            session_id,
            order_id = %order.id,
            tier = %tier,
            "stripe webhook: gift purchase settled"
        );
        Ok(())
    }

    async fn resolve_profile(&self, email: &str) -> StripeWebhookResult<ProfileEntity> {
        if let Some(profile) = self.profile_repo.find_by_email(email).await.map_err(|err| {
            error!(email, db_error = ?err, "stripe webhook: profile lookup failed");
            StripeWebhookError::Internal(err)
        })? {
            return Ok(profile);
        }

        let profile = self
            .profile_repo
            .insert(InsertProfileEntity::invited(email.to_string()))
            .await
            .map_err(|err| {
                error!(email, db_error = ?err, "stripe webhook: failed to create invited profile");
                StripeWebhookError::Internal(err)
            })?;

        info!(email, user_id = %profile.id, "stripe webhook: invited profile created");

        let invite = EmailMessage {
            to: email.to_string(),
            subject: "Finish setting up your Gifting Moments account".to_string(),
            html: format!(
                "<p>Your purchase is in! Sign in with this email address to claim your order: \
                 <a href=\"{}/auth/sign-in\">sign in</a>.</p>",
                self.app_config.base_url.trim_end_matches('/')
            ),
        };
        if let Err(err) = self.email_client.send(invite).await {
            warn!(email, error = ?err, "stripe webhook: invite email failed");
        }

        Ok(profile)
    }

    async fn handle_checkout_failed(&self, event: &StripeEvent) -> StripeWebhookResult<()> {
        let session = Self::extract_session(event)?;
        let session_id = session
            .id
            .as_deref()
            .ok_or_else(|| StripeWebhookError::InvalidWebhook("missing session id".into()))?;

        self.transaction_repo
            .update_status_by_checkout_session_id(session_id, TransactionStatus::Failed)
            .await
            .map_err(|err| {
                error!(session_id, db_error = ?err, "stripe webhook: failed to mark transaction failed");
                StripeWebhookError::Internal(err)
            })?;

        info!(session_id, "stripe webhook: checkout marked failed");
        Ok(())
    }

    async fn handle_charge_refunded(&self, event: &StripeEvent) -> StripeWebhookResult<()> {
        #[derive(Deserialize)]
        struct ChargeObject {
            payment_intent: Option<String>,
        }

        let charge: ChargeObject =
            serde_json::from_value(event.data.object.clone()).map_err(|err| {
                warn!(error = %err, "stripe webhook: malformed charge object");
                StripeWebhookError::InvalidWebhook("malformed charge object".into())
            })?;

        let Some(payment_intent) = charge.payment_intent else {
            warn!("stripe webhook: refunded charge has no payment intent");
            return Ok(());
        };

        let Some(session_id) = self
            .stripe_client
            .find_session_id_by_payment_intent(&payment_intent)
            .await
            .map_err(|err| {
                error!(
                    payment_intent,
                    error = ?err,
                    "stripe webhook: session lookup by payment intent failed"
                );
                StripeWebhookError::Internal(err)
            })?
        else {
            warn!(payment_intent, "stripe webhook: no session for refunded charge");
            return Ok(());
        };

        let Some(transaction) = self
            .transaction_repo
            .find_by_checkout_session_id(&session_id)
            .await
            .map_err(|err| {
                error!(session_id, db_error = ?err, "stripe webhook: transaction lookup failed");
                StripeWebhookError::Internal(err)
            })?
        else {
            warn!(session_id, "stripe webhook: refund for unknown transaction");
            return Ok(());
        };

        if transaction.status == TransactionStatus::Refunded.to_string() {
            info!(session_id, "stripe webhook: transaction already refunded, ignoring replay");
            return Ok(());
        }

        self.transaction_repo
            .update_status_by_checkout_session_id(&session_id, TransactionStatus::Refunded)
            .await
            .map_err(|err| {
                error!(session_id, db_error = ?err, "stripe webhook: failed to mark refunded");
                StripeWebhookError::Internal(err)
            })?;

        // Claw back what the purchase granted. The conditional deduct cannot
        // go negative; an already-spent balance is logged and left alone.
        if transaction.credits_purchased > 0 {
            let clawed_back = self
                .profile_repo
                .deduct_credits(transaction.user_id, transaction.credits_purchased)
                .await
                .map_err(|err| {
                    error!(
                        session_id,
                        user_id = %transaction.user_id,
                        db_error = ?err,
                        "stripe webhook: credit claw-back failed"
                    );
                    StripeWebhookError::Internal(err)
                })?;

            if !clawed_back {
                warn!(
                    session_id,
                    user_id = %transaction.user_id,
                    credits = transaction.credits_purchased,
                    "stripe webhook: refunded credits already spent"
                );
            }
        }

        info!(session_id, "stripe webhook: charge refund settled");
        Ok(())
    }
}
