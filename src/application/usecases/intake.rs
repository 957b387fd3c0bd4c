use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::config_model::Stripe as StripeConfig;
use crate::domain::{
    entities::orders::{OrderEntity, UpdateOrderEntity},
    repositories::{
        asset_storage::AssetStorageClient, orders::OrderRepository, payments::StripeGateway,
    },
    value_objects::{
        enums::order_statuses::{OrderAction, OrderStatus, TransitionError},
        intake::{IntakeSubmission, MAX_REFERENCE_PHOTOS},
        orders::{InterviewData, QuizData},
    },
};

use super::order_claim::{ClaimError, claim_order, upsert_order_from_session};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("order not found")]
    NotFound,
    #[error("order belongs to another user")]
    Forbidden,
    #[error("order_id or checkout_session_id is required")]
    MissingIdentifier,
    #[error("too many reference photos (limit {MAX_REFERENCE_PHOTOS})")]
    TooManyPhotos,
    #[error("order does not accept intake in its current status")]
    InvalidState,
    #[error("checkout session is not paid")]
    SessionNotPaid,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntakeError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            IntakeError::NotFound => StatusCode::NOT_FOUND,
            IntakeError::Forbidden => StatusCode::FORBIDDEN,
            IntakeError::MissingIdentifier
            | IntakeError::TooManyPhotos
            | IntakeError::InvalidState
            | IntakeError::SessionNotPaid => StatusCode::BAD_REQUEST,
            IntakeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClaimError> for IntakeError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::NotFound => IntakeError::NotFound,
            ClaimError::Forbidden => IntakeError::Forbidden,
            ClaimError::MissingIdentifier => IntakeError::MissingIdentifier,
            ClaimError::SessionNotPaid => IntakeError::SessionNotPaid,
            ClaimError::Internal(err) => IntakeError::Internal(err),
        }
    }
}

impl From<TransitionError> for IntakeError {
    fn from(_: TransitionError) -> Self {
        IntakeError::InvalidState
    }
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub success: bool,
    pub order_id: Uuid,
    pub status: String,
    pub interview_data: serde_json::Value,
}

/// Receives the combined interview/quiz/photo/audio submission and moves the
/// order into production.
pub struct IntakeUseCase<O, A, S>
where
    O: OrderRepository + Send + Sync + 'static,
    A: AssetStorageClient + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    asset_storage: Arc<A>,
    stripe_client: Arc<S>,
    stripe_config: StripeConfig,
}

impl<O, A, S> IntakeUseCase<O, A, S>
where
    O: OrderRepository + Send + Sync + 'static,
    A: AssetStorageClient + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        order_repo: Arc<O>,
        asset_storage: Arc<A>,
        stripe_client: Arc<S>,
        stripe_config: StripeConfig,
    ) -> Self {
        Self {
            order_repo,
            asset_storage,
            stripe_client,
            stripe_config,
        }
    }

    pub async fn submit(
        &self,
        user: &AuthUser,
        submission: IntakeSubmission,
    ) -> IntakeResult<IntakeResponse> {
        if submission.reference_photos.len() > MAX_REFERENCE_PHOTOS {
            return Err(IntakeError::TooManyPhotos);
        }

        let order = self.resolve_order(user, &submission).await?;
        let order_id = order.id;

        let current_status =
            OrderStatus::from_str(&order.status).ok_or_else(|| {
                error!(%order_id, status = %order.status, "intake: order has unknown status");
                IntakeError::Internal(anyhow::anyhow!("order has unknown status"))
            })?;

        // Fail before any upload if the order cannot accept intake at all.
        let next_status = current_status.transition(&OrderAction::IntakeSubmitted)?;

        let mut interview_data = InterviewData::from_stored(order.interview_data.as_ref());
        if let Some(patch) = submission.interview_data {
            interview_data.merge(patch);
        }

        let mut quiz_data = QuizData::from_stored(order.quiz_data.as_ref());
        if let Some(incoming) = submission.quiz_data {
            quiz_data.merge(incoming);
        }

        if !submission.reference_photos.is_empty() {
            let mut photo_urls = Vec::with_capacity(submission.reference_photos.len());
            for (index, photo) in submission.reference_photos.iter().enumerate() {
                let object_key =
                    format!("{}/reference-photos/{}.{}", order_id, index, photo.extension);
                let url = self
                    .asset_storage
                    .upload_order_asset(&object_key, photo.bytes.clone(), &photo.content_type)
                    .await
                    .map_err(|err| {
                        error!(
                            %order_id,
                            object_key,
                            error = ?err,
                            "intake: reference photo upload failed"
                        );
                        IntakeError::Internal(err)
                    })?;
                photo_urls.push(url);
            }
            interview_data.reference_photo_urls = photo_urls;
        }

        if let Some(audio) = submission.audio_note.as_ref() {
            let object_key = format!("{}/audio-note.{}", order_id, audio.extension);
            let url = self
                .asset_storage
                .upload_order_asset(&object_key, audio.bytes.clone(), &audio.content_type)
                .await
                .map_err(|err| {
                    error!(%order_id, object_key, error = ?err, "intake: audio note upload failed");
                    IntakeError::Internal(err)
                })?;
            interview_data.audio_note_url = Some(url);
        }

        let updated = self
            .order_repo
            .update(
                order_id,
                UpdateOrderEntity {
                    status: Some(next_status.to_string()),
                    interview_data: Some(interview_data.to_value()),
                    quiz_data: Some(quiz_data.to_value()),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "intake: failed to persist submission");
                IntakeError::Internal(err)
            })?;

        info!(
            %order_id,
            status = %updated.status,
            photos = interview_data.reference_photo_urls.len(),
            has_audio = interview_data.audio_note_url.is_some(),
            "intake: submission accepted"
        );

        Ok(IntakeResponse {
            success: true,
            order_id,
            status: updated.status,
            interview_data: updated
                .interview_data
                .unwrap_or(serde_json::Value::Null),
        })
    }

    async fn resolve_order(
        &self,
        user: &AuthUser,
        submission: &IntakeSubmission,
    ) -> IntakeResult<OrderEntity> {
        let order = if let Some(order_id) = submission.order_id {
            self.order_repo
                .find_by_id(order_id)
                .await
                .map_err(|err| {
                    error!(%order_id, db_error = ?err, "intake: failed to load order");
                    IntakeError::Internal(err)
                })?
                .ok_or(IntakeError::NotFound)?
        } else if let Some(session_id) = submission.checkout_session_id.as_deref() {
            // The payment webhook may not have landed yet; fall back to
            // creating the order straight from the paid session.
            upsert_order_from_session(
                self.order_repo.as_ref(),
                self.stripe_client.as_ref(),
                &self.stripe_config,
                session_id,
            )
            .await?
        } else {
            warn!(user_id = %user.user_id, "intake: no order identifier provided");
            return Err(IntakeError::MissingIdentifier);
        };

        Ok(claim_order(self.order_repo.as_ref(), order, user.user_id).await?)
    }
}
