use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::config_model::Stripe as StripeConfig;
use crate::domain::{
    entities::orders::{InsertOrderEntity, OrderEntity},
    repositories::{
        orders::OrderRepository, payments::StripeGateway,
        pending_checkouts::PendingCheckoutRepository,
    },
    value_objects::{
        enums::{order_statuses::{OrderAction, OrderStatus}, order_tiers::OrderTier},
        orders::{ClaimOrderRequest, OrderDto, generate_view_token},
    },
};

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("order not found")]
    NotFound,
    #[error("order already belongs to another user")]
    Forbidden,
    #[error("order_id or session_id is required")]
    MissingIdentifier,
    #[error("checkout session is not paid")]
    SessionNotPaid,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ClaimError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ClaimError::NotFound => StatusCode::NOT_FOUND,
            ClaimError::Forbidden => StatusCode::FORBIDDEN,
            ClaimError::MissingIdentifier | ClaimError::SessionNotPaid => StatusCode::BAD_REQUEST,
            ClaimError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ClaimResult<T> = std::result::Result<T, ClaimError>;

/// Finds the order for a paid Checkout Session, creating it when the payment
/// webhook has not landed yet. The insert is keyed on the session id, so two
/// racing callers converge on one row.
pub(crate) async fn upsert_order_from_session<O, S>(
    order_repo: &O,
    stripe_client: &S,
    stripe_config: &StripeConfig,
    session_id: &str,
) -> ClaimResult<OrderEntity>
where
    O: OrderRepository + Send + Sync,
    S: StripeGateway + Send + Sync,
{
    if let Some(order) = order_repo
        .find_by_checkout_session_id(session_id)
        .await
        .map_err(|err| {
            error!(session_id, db_error = ?err, "claim: failed to look up order by session");
            ClaimError::Internal(err)
        })?
    {
        return Ok(order);
    }

    let session = stripe_client
        .retrieve_checkout_session(session_id)
        .await
        .map_err(|err| {
            error!(session_id, error = ?err, "claim: failed to retrieve checkout session");
            ClaimError::Internal(err)
        })?;

    if session.payment_status.as_deref() != Some("paid") {
        warn!(
            session_id,
            payment_status = ?session.payment_status,
            "claim: checkout session is not paid"
        );
        return Err(ClaimError::SessionNotPaid);
    }

    // Session metadata wins; the purchased price id is the fallback for
    // sessions created before tiers were stamped into metadata.
    let tier = session
        .metadata_value("tier")
        .and_then(OrderTier::from_str)
        .or_else(|| {
            session
                .first_price_id()
                .and_then(|price_id| stripe_config.tier_for_price_id(price_id))
                .and_then(OrderTier::from_str)
        })
        .unwrap_or_else(|| {
            warn!(session_id, "claim: unable to resolve tier, defaulting to standard");
            OrderTier::Standard
        });

    let status = OrderStatus::Pending
        .transition(&OrderAction::CheckoutCompleted)
        .unwrap_or(OrderStatus::PendingInterview);

    let now = Utc::now();
    let insert_entity = InsertOrderEntity {
        user_id: None,
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
    };

    let order = order_repo
        .upsert_by_checkout_session(insert_entity)
        .await
        .map_err(|err| {
            error!(session_id, db_error = ?err, "claim: failed to upsert order for session");
            ClaimError::Internal(err)
        })?;

    info!(session_id, order_id = %order.id, tier = %tier, "claim: order created for session");
    Ok(order)
}

/// Attaches the caller to the order. Succeeds only when the order is unowned
/// or already theirs.
pub(crate) async fn claim_order<O>(
    order_repo: &O,
    order: OrderEntity,
    user_id: Uuid,
) -> ClaimResult<OrderEntity>
where
    O: OrderRepository + Send + Sync,
{
    match order.user_id {
        Some(owner) if owner == user_id => Ok(order),
        Some(owner) => {
            warn!(
                order_id = %order.id,
                %owner,
                claimant = %user_id,
                "claim: order already owned by another user"
            );
            Err(ClaimError::Forbidden)
        }
        None => {
            order_repo.set_owner(order.id, user_id).await.map_err(|err| {
                error!(order_id = %order.id, db_error = ?err, "claim: failed to set order owner");
                ClaimError::Internal(err)
            })?;
            info!(order_id = %order.id, %user_id, "claim: order claimed");
            Ok(OrderEntity {
                user_id: Some(user_id),
                ..order
            })
        }
    }
}

pub struct OrderClaimUseCase<O, PC, S>
where
    O: OrderRepository + Send + Sync + 'static,
    PC: PendingCheckoutRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    pending_checkout_repo: Arc<PC>,
    stripe_client: Arc<S>,
    stripe_config: StripeConfig,
}

impl<O, PC, S> OrderClaimUseCase<O, PC, S>
where
    O: OrderRepository + Send + Sync + 'static,
    PC: PendingCheckoutRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        order_repo: Arc<O>,
        pending_checkout_repo: Arc<PC>,
        stripe_client: Arc<S>,
        stripe_config: StripeConfig,
    ) -> Self {
        Self {
            order_repo,
            pending_checkout_repo,
            stripe_client,
            stripe_config,
        }
    }

    pub async fn claim(&self, user: &AuthUser, request: ClaimOrderRequest) -> ClaimResult<OrderDto> {
        if let Some(order_id) = request.order_id {
            return self.claim_by_order_id(user, order_id).await;
        }

        if let Some(session_id) = request.session_id.as_deref() {
            return self.claim_by_session_id(user, session_id).await;
        }

        warn!(user_id = %user.user_id, "claim: request carried neither order_id nor session_id");
        Err(ClaimError::MissingIdentifier)
    }

    async fn claim_by_order_id(&self, user: &AuthUser, order_id: Uuid) -> ClaimResult<OrderDto> {
        info!(%order_id, user_id = %user.user_id, "claim: claiming by order id");

        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "claim: failed to load order");
                ClaimError::Internal(err)
            })?
            .ok_or(ClaimError::NotFound)?;

        let order = claim_order(self.order_repo.as_ref(), order, user.user_id).await?;
        Ok(OrderDto::from(order))
    }

    async fn claim_by_session_id(&self, user: &AuthUser, session_id: &str) -> ClaimResult<OrderDto> {
        info!(session_id, user_id = %user.user_id, "claim: claiming by session id");

        let order = upsert_order_from_session(
            self.order_repo.as_ref(),
            self.stripe_client.as_ref(),
            &self.stripe_config,
            session_id,
        )
        .await?;

        let order = claim_order(self.order_repo.as_ref(), order, user.user_id).await?;

        // The magic-link bridge entry has served its purpose; drop it so the
        // session id cannot be replayed from the mailbox later.
        if let Some(email) = user.email.as_deref() {
            if let Err(err) = self.pending_checkout_repo.delete_by_email(email).await {
                warn!(email, error = ?err, "claim: failed to clear pending checkout entry");
            }
        }

        Ok(OrderDto::from(order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{
        orders::MockOrderRepository, payments::MockStripeGateway,
        pending_checkouts::MockPendingCheckoutRepository,
    };
    use crate::domain::value_objects::payments::StripeCheckoutSession;
    use mockall::predicate::eq;
    use std::collections::HashMap;

    fn stripe_config() -> StripeConfig {
        StripeConfig {
            secret_key: "sk_test".to_string(),
            webhook_secret: "whsec_test".to_string(),
            success_url: "https://example.com/s".to_string(),
            cancel_url: "https://example.com/c".to_string(),
            price_standard: "price_std".to_string(),
            price_premium: "price_prm".to_string(),
            price_biography: "price_bio".to_string(),
        }
    }

    fn auth_user(user_id: Uuid) -> AuthUser {
        AuthUser {
            user_id,
            email: Some("buyer@example.com".to_string()),
            role: "authenticated".to_string(),
        }
    }

    fn unowned_order(order_id: Uuid) -> OrderEntity {
        let now = Utc::now();
        OrderEntity {
            id: order_id,
            user_id: None,
            tier: "standard".to_string(),
            status: "pending_interview".to_string(),
            quiz_data: None,
            interview_data: None,
            stripe_checkout_session_id: Some("cs_test_1".to_string()),
            final_video_url: None,
            view_token: "token".to_string(),
            first_viewed_at: None,
            recipient_name: None,
            recipient_email: None,
            amount_paid: Some(4900),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn claims_unowned_order_by_id() {
        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = unowned_order(order_id);

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });
        order_repo
            .expect_set_owner()
            .with(eq(order_id), eq(user_id))
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let usecase = OrderClaimUseCase::new(
            Arc::new(order_repo),
            Arc::new(MockPendingCheckoutRepository::new()),
            Arc::new(MockStripeGateway::new()),
            stripe_config(),
        );

        let claimed = usecase
            .claim(
                &auth_user(user_id),
                ClaimOrderRequest {
                    order_id: Some(order_id),
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(claimed.user_id, Some(user_id));
    }

    #[tokio::test]
    async fn second_claim_by_different_user_is_forbidden() {
        let order_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let mut order = unowned_order(order_id);
        order.user_id = Some(owner);

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });

        let usecase = OrderClaimUseCase::new(
            Arc::new(order_repo),
            Arc::new(MockPendingCheckoutRepository::new()),
            Arc::new(MockStripeGateway::new()),
            stripe_config(),
        );

        let result = usecase
            .claim(
                &auth_user(intruder),
                ClaimOrderRequest {
                    order_id: Some(order_id),
                    session_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(ClaimError::Forbidden)));
    }

    #[tokio::test]
    async fn claim_by_owner_is_a_no_op() {
        let order_id = Uuid::new_v4();
        let owner = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let mut order = unowned_order(order_id);
        order.user_id = Some(owner);

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });

        let usecase = OrderClaimUseCase::new(
            Arc::new(order_repo),
            Arc::new(MockPendingCheckoutRepository::new()),
            Arc::new(MockStripeGateway::new()),
            stripe_config(),
        );

        let claimed = usecase
            .claim(
                &auth_user(owner),
                ClaimOrderRequest {
                    order_id: Some(order_id),
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(claimed.user_id, Some(owner));
    }

    #[tokio::test]
    async fn session_claim_creates_pending_interview_order_from_metadata() {
        let user_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let mut stripe_client = MockStripeGateway::new();
        let mut pending_repo = MockPendingCheckoutRepository::new();

        order_repo
            .expect_find_by_checkout_session_id()
            .with(eq("cs_test_1"))
            .returning(|_| Box::pin(async { Ok(None) }));

        stripe_client
            .expect_retrieve_checkout_session()
            .with(eq("cs_test_1"))
            .returning(|_| {
                Box::pin(async {
                    Ok(StripeCheckoutSession {
                        id: Some("cs_test_1".to_string()),
                        payment_status: Some("paid".to_string()),
                        amount_total: Some(4900),
                        metadata: Some(HashMap::from([(
                            "tier".to_string(),
                            "standard".to_string(),
                        )])),
                        ..Default::default()
                    })
                })
            });

        order_repo
            .expect_upsert_by_checkout_session()
            .withf(|entity| {
                entity.status == "pending_interview"
                    && entity.tier == "standard"
                    && entity.user_id.is_none()
                    && entity.stripe_checkout_session_id.as_deref() == Some("cs_test_1")
            })
            .returning(|entity| {
                Box::pin(async move {
                    let now = Utc::now();
                    Ok(OrderEntity {
                        id: Uuid::new_v4(),
                        user_id: entity.user_id,
                        tier: entity.tier,
                        status: entity.status,
                        quiz_data: entity.quiz_data,
                        interview_data: entity.interview_data,
                        stripe_checkout_session_id: entity.stripe_checkout_session_id,
                        final_video_url: None,
                        view_token: entity.view_token,
                        first_viewed_at: None,
                        recipient_name: entity.recipient_name,
                        recipient_email: entity.recipient_email,
                        amount_paid: entity.amount_paid,
                        created_at: now,
                        updated_at: now,
                    })
                })
            });

        order_repo
            .expect_set_owner()
            .withf(move |_, claimant| *claimant == user_id)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        pending_repo
            .expect_delete_by_email()
            .with(eq("buyer@example.com"))
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = OrderClaimUseCase::new(
            Arc::new(order_repo),
            Arc::new(pending_repo),
            Arc::new(stripe_client),
            stripe_config(),
        );

        let claimed = usecase
            .claim(
                &auth_user(user_id),
                ClaimOrderRequest {
                    order_id: None,
                    session_id: Some("cs_test_1".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(claimed.status, "pending_interview");
        assert_eq!(claimed.tier, "standard");
        assert_eq!(claimed.user_id, Some(user_id));
    }

    #[tokio::test]
    async fn missing_identifier_is_rejected() {
        let usecase = OrderClaimUseCase::new(
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockPendingCheckoutRepository::new()),
            Arc::new(MockStripeGateway::new()),
            stripe_config(),
        );

        let result = usecase
            .claim(
                &auth_user(Uuid::new_v4()),
                ClaimOrderRequest {
                    order_id: None,
                    session_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(ClaimError::MissingIdentifier)));
    }
}
