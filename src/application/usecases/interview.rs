use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{
    entities::orders::UpdateOrderEntity,
    repositories::orders::OrderRepository,
    value_objects::{
        enums::order_statuses::OrderStatus,
        orders::{InterviewData, InterviewPatch, OrderDto},
    },
};

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("order not found")]
    NotFound,
    #[error("order belongs to another user")]
    Forbidden,
    #[error("interview is closed for this order")]
    InterviewClosed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl InterviewError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            InterviewError::NotFound => StatusCode::NOT_FOUND,
            InterviewError::Forbidden => StatusCode::FORBIDDEN,
            InterviewError::InterviewClosed => StatusCode::BAD_REQUEST,
            InterviewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type InterviewResult<T> = std::result::Result<T, InterviewError>;

/// Incremental autosave of interview answers while the order is still waiting
/// on the interview.
pub struct InterviewUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
}

impl<O> InterviewUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    pub async fn autosave(
        &self,
        user: &AuthUser,
        order_id: Uuid,
        patch: InterviewPatch,
    ) -> InterviewResult<OrderDto> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "interview: failed to load order");
                InterviewError::Internal(err)
            })?
            .ok_or(InterviewError::NotFound)?;

        if order.user_id != Some(user.user_id) {
            warn!(
                %order_id,
                user_id = %user.user_id,
                owner = ?order.user_id,
                "interview: autosave from non-owner"
            );
            return Err(InterviewError::Forbidden);
        }

        // Autosave only makes sense before intake closes the interview; once
        // the order moves on, the saved answers are frozen.
        if OrderStatus::from_str(&order.status) != Some(OrderStatus::PendingInterview) {
            warn!(
                %order_id,
                status = %order.status,
                "interview: autosave rejected, order no longer pending interview"
            );
            return Err(InterviewError::InterviewClosed);
        }

        let mut interview_data = InterviewData::from_stored(order.interview_data.as_ref());
        interview_data.merge(patch);

        let updated = self
            .order_repo
            .update(
                order_id,
                UpdateOrderEntity {
                    interview_data: Some(interview_data.to_value()),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "interview: failed to save answers");
                InterviewError::Internal(err)
            })?;

        info!(%order_id, step = ?interview_data.step, "interview: autosaved");
        Ok(OrderDto::from(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::orders::OrderEntity;
    use crate::domain::repositories::orders::MockOrderRepository;
    use mockall::predicate::eq;
    use std::collections::BTreeMap;

    fn order_with_status(order_id: Uuid, user_id: Uuid, status: &str) -> OrderEntity {
        let now = Utc::now();
        OrderEntity {
            id: order_id,
            user_id: Some(user_id),
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

    fn auth_user(user_id: Uuid) -> AuthUser {
        AuthUser {
            user_id,
            email: None,
            role: "authenticated".to_string(),
        }
    }

    fn patch() -> InterviewPatch {
        InterviewPatch {
            answers: BTreeMap::from([("q1".to_string(), "an answer".to_string())]),
            step: Some(2),
        }
    }

    #[tokio::test]
    async fn autosave_merges_answers_while_pending_interview() {
        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = order_with_status(order_id, user_id, "pending_interview");

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });
        order_repo
            .expect_update()
            .withf(move |id, changeset| {
                let saved: InterviewData = changeset
                    .interview_data
                    .clone()
                    .map(|value| serde_json::from_value(value).unwrap())
                    .unwrap();
                *id == order_id
                    && saved.step == Some(2)
                    && saved.answers.get("q1").map(String::as_str) == Some("an answer")
                    && changeset.status.is_none()
            })
            .returning(move |id, _| {
                Box::pin(async move {
                    Ok(order_with_status(id, user_id, "pending_interview"))
                })
            });

        let usecase = InterviewUseCase::new(Arc::new(order_repo));
        usecase
            .autosave(&auth_user(user_id), order_id, patch())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn autosave_rejected_once_order_left_pending_interview() {
        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = order_with_status(order_id, user_id, "in_production");

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });
        // No update expectation: a write after rejection would fail the test.

        let usecase = InterviewUseCase::new(Arc::new(order_repo));
        let result = usecase
            .autosave(&auth_user(user_id), order_id, patch())
            .await;

        assert!(matches!(result, Err(InterviewError::InterviewClosed)));
    }

    #[tokio::test]
    async fn autosave_from_non_owner_is_forbidden() {
        let order_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();

        let mut order_repo = MockOrderRepository::new();
        let order = order_with_status(order_id, owner, "pending_interview");

        order_repo
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });

        let usecase = InterviewUseCase::new(Arc::new(order_repo));
        let result = usecase
            .autosave(&auth_user(intruder), order_id, patch())
            .await;

        assert!(matches!(result, Err(InterviewError::Forbidden)));
    }
}
