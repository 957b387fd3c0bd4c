use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{
    entities::orders::{InsertOrderEntity, UpdateOrderEntity},
    repositories::{orders::OrderRepository, profiles::ProfileRepository},
    value_objects::{
        enums::{
            order_statuses::{OrderAction, OrderStatus},
            order_tiers::OrderTier,
        },
        orders::{
            AdminCreateOrderRequest, AdminUpdateOrderRequest, OrderDto, generate_view_token,
        },
    },
};

const ADMIN_ORDER_LIST_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum AdminOrderError {
    #[error("admin access required")]
    Forbidden,
    #[error("order not found")]
    NotFound,
    #[error("invalid order status")]
    InvalidStatus,
    #[error("invalid order tier")]
    InvalidTier,
    #[error("status change is not allowed for this order")]
    InvalidTransition,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AdminOrderError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AdminOrderError::Forbidden => StatusCode::FORBIDDEN,
            AdminOrderError::NotFound => StatusCode::NOT_FOUND,
            AdminOrderError::InvalidStatus
            | AdminOrderError::InvalidTier
            | AdminOrderError::InvalidTransition => StatusCode::BAD_REQUEST,
            AdminOrderError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type AdminOrderResult<T> = std::result::Result<T, AdminOrderError>;

/// Back-office order management, gated on `profiles.is_admin`.
pub struct AdminOrderUseCase<O, P>
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    profile_repo: Arc<P>,
}

impl<O, P> AdminOrderUseCase<O, P>
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>, profile_repo: Arc<P>) -> Self {
        Self {
            order_repo,
            profile_repo,
        }
    }

    async fn ensure_admin(&self, user: &AuthUser) -> AdminOrderResult<()> {
        let profile = self
            .profile_repo
            .find_by_id(user.user_id)
            .await
            .map_err(|err| {
                error!(user_id = %user.user_id, db_error = ?err, "admin orders: profile lookup failed");
                AdminOrderError::Internal(err)
            })?;

        match profile {
            Some(profile) if profile.is_admin => Ok(()),
            _ => {
                warn!(user_id = %user.user_id, "admin orders: non-admin access attempt");
                Err(AdminOrderError::Forbidden)
            }
        }
    }

    pub async fn list_orders(&self, user: &AuthUser) -> AdminOrderResult<Vec<OrderDto>> {
        self.ensure_admin(user).await?;

        let orders = self
            .order_repo
            .list_recent(ADMIN_ORDER_LIST_LIMIT)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "admin orders: list failed");
                AdminOrderError::Internal(err)
            })?;

        Ok(orders.into_iter().map(OrderDto::from).collect())
    }

    pub async fn get_order(&self, user: &AuthUser, order_id: Uuid) -> AdminOrderResult<OrderDto> {
        self.ensure_admin(user).await?;

        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "admin orders: lookup failed");
                AdminOrderError::Internal(err)
            })?
            .ok_or(AdminOrderError::NotFound)?;

        Ok(OrderDto::from(order))
    }

    /// Manual order creation for off-platform sales.
    pub async fn create_order(
        &self,
        user: &AuthUser,
        request: AdminCreateOrderRequest,
    ) -> AdminOrderResult<OrderDto> {
        self.ensure_admin(user).await?;

        let tier = OrderTier::from_str(&request.tier).ok_or(AdminOrderError::InvalidTier)?;

        let now = Utc::now();
        let order = self
            .order_repo
            .insert(InsertOrderEntity {
                user_id: None,
                tier: tier.to_string(),
                status: OrderStatus::PendingInterview.to_string(),
                quiz_data: None,
                interview_data: None,
                stripe_checkout_session_id: None,
                view_token: generate_view_token(),
                recipient_name: request.recipient_name,
                recipient_email: request.recipient_email,
                amount_paid: request.amount_paid,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "admin orders: manual create failed");
                AdminOrderError::Internal(err)
            })?;

        info!(order_id = %order.id, admin_id = %user.user_id, "admin orders: order created");
        Ok(OrderDto::from(order))
    }

    pub async fn update_order(
        &self,
        user: &AuthUser,
        order_id: Uuid,
        request: AdminUpdateOrderRequest,
    ) -> AdminOrderResult<OrderDto> {
        self.ensure_admin(user).await?;

        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "admin orders: lookup failed");
                AdminOrderError::Internal(err)
            })?
            .ok_or(AdminOrderError::NotFound)?;

        let next_status = match request.status.as_deref() {
            Some(raw) => {
                let requested =
                    OrderStatus::from_str(raw).ok_or(AdminOrderError::InvalidStatus)?;
                let current = OrderStatus::from_str(&order.status)
                    .ok_or(AdminOrderError::InvalidStatus)?;

                let next = current
                    .transition(&OrderAction::AdminSetStatus(requested))
                    .map_err(|rejection| {
                        warn!(
                            %order_id,
                            current = %order.status,
                            requested = raw,
                            %rejection,
                            "admin orders: status change rejected"
                        );
                        AdminOrderError::InvalidTransition
                    })?;
                Some(next.to_string())
            }
            None => None,
        };

        let tier = match request.tier.as_deref() {
            Some(raw) => Some(
                OrderTier::from_str(raw)
                    .ok_or(AdminOrderError::InvalidTier)?
                    .to_string(),
            ),
            None => None,
        };

        let updated = self
            .order_repo
            .update(
                order_id,
                UpdateOrderEntity {
                    status: next_status,
                    tier,
                    final_video_url: request.final_video_url,
                    recipient_name: request.recipient_name,
                    recipient_email: request.recipient_email,
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "admin orders: update failed");
                AdminOrderError::Internal(err)
            })?;

        info!(
            %order_id,
            admin_id = %user.user_id,
            status = %updated.status,
            "admin orders: order updated"
        );
        Ok(OrderDto::from(updated))
    }

    /// DELETE is a soft cancel; the row and its assets survive.
    pub async fn soft_delete(&self, user: &AuthUser, order_id: Uuid) -> AdminOrderResult<OrderDto> {
        self.ensure_admin(user).await?;

        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "admin orders: lookup failed");
                AdminOrderError::Internal(err)
            })?
            .ok_or(AdminOrderError::NotFound)?;

        let current =
            OrderStatus::from_str(&order.status).ok_or(AdminOrderError::InvalidStatus)?;
        let next = current
            .transition(&OrderAction::Cancel)
            .map_err(|_| AdminOrderError::InvalidTransition)?;

        let updated = self
            .order_repo
            .update(
                order_id,
                UpdateOrderEntity {
                    status: Some(next.to_string()),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "admin orders: cancel failed");
                AdminOrderError::Internal(err)
            })?;

        info!(%order_id, admin_id = %user.user_id, "admin orders: order cancelled");
        Ok(OrderDto::from(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::orders::OrderEntity;
    use crate::domain::entities::profiles::ProfileEntity;
    use crate::domain::repositories::{
        orders::MockOrderRepository, profiles::MockProfileRepository,
    };
    use mockall::predicate::eq;

    fn auth_user(user_id: Uuid) -> AuthUser {
        AuthUser {
            user_id,
            email: None,
            role: "authenticated".to_string(),
        }
    }

    fn profile(user_id: Uuid, is_admin: bool) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id: user_id,
            email: "admin@example.com".to_string(),
            full_name: None,
            is_admin,
            credits: 0,
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn order_with_status(order_id: Uuid, status: &str) -> OrderEntity {
        let now = Utc::now();
        OrderEntity {
            id: order_id,
            user_id: Some(Uuid::new_v4()),
            tier: "standard".to_string(),
            status: status.to_string(),
            quiz_data: None,
            interview_data: None,
            stripe_checkout_session_id: None,
            final_video_url: None,
            view_token: "token".to_string(),
            first_viewed_at: None,
            recipient_name: None,
            recipient_email: None,
            amount_paid: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn admin_profile_repo(user_id: Uuid, is_admin: bool) -> MockProfileRepository {
        let mut profile_repo = MockProfileRepository::new();
        profile_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                Box::pin(async move { Ok(Some(profile(user_id, is_admin))) })
            });
        profile_repo
    }

    #[tokio::test]
    async fn non_admin_is_rejected() {
        let user_id = Uuid::new_v4();

        let usecase = AdminOrderUseCase::new(
            Arc::new(MockOrderRepository::new()),
            Arc::new(admin_profile_repo(user_id, false)),
        );

        let result = usecase.list_orders(&auth_user(user_id)).await;
        assert!(matches!(result, Err(AdminOrderError::Forbidden)));
    }

    #[tokio::test]
    async fn ready_without_final_video_url_is_allowed() {
        let admin_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = order_with_status(order_id, "in_production");

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });
        order_repo
            .expect_update()
            .withf(|_, changeset| {
                changeset.status.as_deref() == Some("ready")
                    && changeset.final_video_url.is_none()
            })
            .returning(move |id, _| {
                Box::pin(async move { Ok(order_with_status(id, "ready")) })
            });

        let usecase = AdminOrderUseCase::new(
            Arc::new(order_repo),
            Arc::new(admin_profile_repo(admin_id, true)),
        );

        let updated = usecase
            .update_order(
                &auth_user(admin_id),
                order_id,
                AdminUpdateOrderRequest {
                    status: Some("ready".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, "ready");
    }

    #[tokio::test]
    async fn unknown_status_value_is_rejected() {
        let admin_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = order_with_status(order_id, "in_production");

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });

        let usecase = AdminOrderUseCase::new(
            Arc::new(order_repo),
            Arc::new(admin_profile_repo(admin_id, true)),
        );

        let result = usecase
            .update_order(
                &auth_user(admin_id),
                order_id,
                AdminUpdateOrderRequest {
                    status: Some("shipped".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AdminOrderError::InvalidStatus)));
    }

    #[tokio::test]
    async fn delete_soft_cancels_the_order() {
        let admin_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = order_with_status(order_id, "pending_interview");

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });
        order_repo
            .expect_update()
            .withf(|_, changeset| changeset.status.as_deref() == Some("cancelled"))
            .returning(move |id, _| {
                Box::pin(async move { Ok(order_with_status(id, "cancelled")) })
            });

        let usecase = AdminOrderUseCase::new(
            Arc::new(order_repo),
            Arc::new(admin_profile_repo(admin_id, true)),
        );

        let cancelled = usecase
            .soft_delete(&auth_user(admin_id), order_id)
            .await
            .unwrap();

        assert_eq!(cancelled.status, "cancelled");
    }

    #[tokio::test]
    async fn delete_of_delivered_order_is_rejected() {
        let admin_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = order_with_status(order_id, "delivered");

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });

        let usecase = AdminOrderUseCase::new(
            Arc::new(order_repo),
            Arc::new(admin_profile_repo(admin_id, true)),
        );

        let result = usecase.soft_delete(&auth_user(admin_id), order_id).await;
        assert!(matches!(result, Err(AdminOrderError::InvalidTransition)));
    }
}
