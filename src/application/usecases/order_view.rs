use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::orders::OrderEntity,
    repositories::orders::OrderRepository,
    value_objects::{
        enums::{order_statuses::OrderStatus, order_tiers::OrderTier},
        orders::GiftViewDto,
    },
};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("order not found")]
    NotFound,
    #[error("invalid view token")]
    Forbidden,
    #[error("order is not ready for viewing")]
    NotReady,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ViewError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ViewError::NotFound => StatusCode::NOT_FOUND,
            ViewError::Forbidden | ViewError::NotReady => StatusCode::FORBIDDEN,
            ViewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ViewResult<T> = std::result::Result<T, ViewError>;

/// Unauthenticated gift viewing behind a capability token. All reads/writes
/// here run on the privileged data path because the viewer has no session.
pub struct OrderViewUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
}

impl<O> OrderViewUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    async fn authorize(&self, order_id: Uuid, token: &str) -> ViewResult<OrderEntity> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "view: failed to load order");
                ViewError::Internal(err)
            })?
            .ok_or(ViewError::NotFound)?;

        // Bespoke productions are delivered off-platform; their links behave
        // as if the order does not exist.
        if OrderTier::from_str(&order.tier) == Some(OrderTier::Custom) {
            warn!(%order_id, "view: custom-tier order is not viewable");
            return Err(ViewError::NotFound);
        }

        if order.view_token != token {
            warn!(%order_id, "view: token mismatch");
            return Err(ViewError::Forbidden);
        }

        match OrderStatus::from_str(&order.status) {
            Some(OrderStatus::Ready) | Some(OrderStatus::Delivered) => Ok(order),
            _ => {
                warn!(%order_id, status = %order.status, "view: order not ready");
                Err(ViewError::NotReady)
            }
        }
    }

    pub async fn view(&self, order_id: Uuid, token: &str) -> ViewResult<GiftViewDto> {
        let order = self.authorize(order_id, token).await?;
        Ok(GiftViewDto::from(order))
    }

    /// Records the very first open of the gift link; later opens are
    /// read-only.
    pub async fn record_first_view(&self, order_id: Uuid, token: &str) -> ViewResult<GiftViewDto> {
        let order = self.authorize(order_id, token).await?;

        if order.first_viewed_at.is_none() {
            let viewed_at = Utc::now();
            self.order_repo
                .record_first_view(order_id, viewed_at)
                .await
                .map_err(|err| {
                    error!(%order_id, db_error = ?err, "view: failed to record first view");
                    ViewError::Internal(err)
                })?;
            info!(%order_id, "view: first view recorded");

            return Ok(GiftViewDto::from(OrderEntity {
                first_viewed_at: Some(viewed_at),
                ..order
            }));
        }

        Ok(GiftViewDto::from(order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::orders::MockOrderRepository;
    use mockall::predicate::eq;

    fn viewable_order(order_id: Uuid, tier: &str, status: &str) -> OrderEntity {
        let now = Utc::now();
        OrderEntity {
            id: order_id,
            user_id: Some(Uuid::new_v4()),
            tier: tier.to_string(),
            status: status.to_string(),
            quiz_data: None,
            interview_data: None,
            stripe_checkout_session_id: None,
            final_video_url: Some("https://cdn.example/final.mp4".to_string()),
            view_token: "correct-token".to_string(),
            first_viewed_at: None,
            recipient_name: Some("Grandma".to_string()),
            recipient_email: None,
            amount_paid: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn repo_returning(order: OrderEntity) -> MockOrderRepository {
        let mut order_repo = MockOrderRepository::new();
        let order_id = order.id;
        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });
        order_repo
    }

    #[tokio::test]
    async fn wrong_token_is_forbidden_regardless_of_status() {
        for status in ["pending_interview", "in_production", "ready", "delivered"] {
            let order_id = Uuid::new_v4();
            let usecase = OrderViewUseCase::new(Arc::new(repo_returning(viewable_order(
                order_id, "standard", status,
            ))));

            let result = usecase.view(order_id, "wrong-token").await;
            assert!(matches!(result, Err(ViewError::Forbidden)));
        }
    }

    #[tokio::test]
    async fn custom_tier_is_hidden_even_with_correct_token() {
        let order_id = Uuid::new_v4();
        let usecase = OrderViewUseCase::new(Arc::new(repo_returning(viewable_order(
            order_id, "custom", "ready",
        ))));

        let result = usecase.view(order_id, "correct-token").await;
        assert!(matches!(result, Err(ViewError::NotFound)));
    }

    #[tokio::test]
    async fn unfinished_order_is_not_viewable() {
        let order_id = Uuid::new_v4();
        let usecase = OrderViewUseCase::new(Arc::new(repo_returning(viewable_order(
            order_id,
            "standard",
            "in_production",
        ))));

        let result = usecase.view(order_id, "correct-token").await;
        assert!(matches!(result, Err(ViewError::NotReady)));
    }

    #[tokio::test]
    async fn first_view_is_recorded_exactly_once() {
        let order_id = Uuid::new_v4();

        let mut order_repo = repo_returning(viewable_order(order_id, "standard", "ready"));
        order_repo
            .expect_record_first_view()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let usecase = OrderViewUseCase::new(Arc::new(order_repo));
        let dto = usecase
            .record_first_view(order_id, "correct-token")
            .await
            .unwrap();
        assert!(dto.first_viewed_at.is_some());
    }

    #[tokio::test]
    async fn second_view_does_not_touch_the_timestamp() {
        let order_id = Uuid::new_v4();

        let mut order = viewable_order(order_id, "standard", "delivered");
        order.first_viewed_at = Some(Utc::now());

        // No record_first_view expectation: a second write would fail here.
        let usecase = OrderViewUseCase::new(Arc::new(repo_returning(order)));
        usecase
            .record_first_view(order_id, "correct-token")
            .await
            .unwrap();
    }
}
