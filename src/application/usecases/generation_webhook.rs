use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{
    entities::generations::UpdateGenerationEntity,
    repositories::{generations::GenerationRepository, profiles::ProfileRepository},
    value_objects::{
        ai::{AI_STATUS_COMPLETED, AI_STATUS_FAILED, AiWebhookPayload},
        enums::generation_statuses::GenerationStatus,
    },
};

#[derive(Debug, Error)]
pub enum GenerationWebhookError {
    #[error("unknown generation job")]
    UnknownJob,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GenerationWebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GenerationWebhookError::UnknownJob => StatusCode::NOT_FOUND,
            GenerationWebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type GenerationWebhookResult<T> = std::result::Result<T, GenerationWebhookError>;

/// Applies AI-provider completion callbacks to generation records. Terminal
/// rows are never re-applied, so a replayed callback cannot refund twice.
pub struct GenerationWebhookUseCase<G, P>
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    generation_repo: Arc<G>,
    profile_repo: Arc<P>,
}

impl<G, P> GenerationWebhookUseCase<G, P>
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(generation_repo: Arc<G>, profile_repo: Arc<P>) -> Self {
        Self {
            generation_repo,
            profile_repo,
        }
    }

    pub async fn reconcile(&self, payload: AiWebhookPayload) -> GenerationWebhookResult<()> {
        info!(
            job_id = %payload.job_id,
            status = %payload.status,
            "generation webhook: callback received"
        );

        let generation = self
            .generation_repo
            .find_by_prediction_id(&payload.job_id)
            .await
            .map_err(|err| {
                error!(
                    job_id = %payload.job_id,
                    db_error = ?err,
                    "generation webhook: lookup failed"
                );
                GenerationWebhookError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(job_id = %payload.job_id, "generation webhook: unknown job id");
                GenerationWebhookError::UnknownJob
            })?;

        if GenerationStatus::from_str(&generation.status)
            .map(|status| status.is_terminal())
            .unwrap_or(false)
        {
            info!(
                job_id = %payload.job_id,
                generation_id = %generation.id,
                status = %generation.status,
                "generation webhook: already terminal, ignoring replay"
            );
            return Ok(());
        }

        match payload.status.as_str() {
            AI_STATUS_COMPLETED => {
                self.generation_repo
                    .update(
                        generation.id,
                        UpdateGenerationEntity {
                            status: Some(GenerationStatus::Completed.to_string()),
                            result_url: payload.result_url,
                            completed_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|err| {
                        error!(
                            generation_id = %generation.id,
                            db_error = ?err,
                            "generation webhook: failed to record completion"
                        );
                        GenerationWebhookError::Internal(err)
                    })?;
                info!(generation_id = %generation.id, "generation webhook: completed");
            }
            AI_STATUS_FAILED => {
                if generation.credits_used > 0 {
                    self.profile_repo
                        .add_credits(generation.user_id, generation.credits_used)
                        .await
                        .map_err(|err| {
                            error!(
                                generation_id = %generation.id,
                                user_id = %generation.user_id,
                                db_error = ?err,
                                "generation webhook: refund failed"
                            );
                            GenerationWebhookError::Internal(err)
                        })?;
                }

                self.generation_repo
                    .update(
                        generation.id,
                        UpdateGenerationEntity {
                            status: Some(GenerationStatus::Failed.to_string()),
                            error_message: payload.error,
                            completed_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|err| {
                        error!(
                            generation_id = %generation.id,
                            db_error = ?err,
                            "generation webhook: failed to record failure"
                        );
                        GenerationWebhookError::Internal(err)
                    })?;
                info!(
                    generation_id = %generation.id,
                    refunded = generation.credits_used,
                    "generation webhook: failed, credits refunded"
                );
            }
            other => {
                debug!(
                    job_id = %payload.job_id,
                    status = other,
                    "generation webhook: non-terminal status ignored"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::generations::GenerationEntity;
    use crate::domain::repositories::{
        generations::MockGenerationRepository, profiles::MockProfileRepository,
    };
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn processing_generation(job_id: &str, credits_used: i32) -> GenerationEntity {
        let now = Utc::now();
        GenerationEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            type_: "video_generate".to_string(),
            status: "processing".to_string(),
            original_image_url: None,
            prompt: None,
            settings: None,
            credits_used,
            replicate_prediction_id: Some(job_id.to_string()),
            result_url: None,
            error_message: None,
            completed_at: None,
            created_at: now,
        }
    }

    fn payload(job_id: &str, status: &str) -> AiWebhookPayload {
        AiWebhookPayload {
            job_id: job_id.to_string(),
            status: status.to_string(),
            result_url: Some("https://cdn.example/out.mp4".to_string()),
            error: Some("boom".to_string()),
        }
    }

    #[tokio::test]
    async fn unknown_job_id_is_a_404_and_mutates_nothing() {
        let mut generation_repo = MockGenerationRepository::new();
        generation_repo
            .expect_find_by_prediction_id()
            .with(eq("job_missing"))
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = GenerationWebhookUseCase::new(
            Arc::new(generation_repo),
            Arc::new(MockProfileRepository::new()),
        );

        let result = usecase.reconcile(payload("job_missing", "completed")).await;
        assert!(matches!(result, Err(GenerationWebhookError::UnknownJob)));
    }

    #[tokio::test]
    async fn failed_callback_refunds_exactly_credits_used() {
        let mut generation_repo = MockGenerationRepository::new();
        let mut profile_repo = MockProfileRepository::new();

        let entity = processing_generation("job_7", 5);
        let user_id = entity.user_id;
        let generation_id = entity.id;

        generation_repo
            .expect_find_by_prediction_id()
            .with(eq("job_7"))
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });
        profile_repo
            .expect_add_credits()
            .with(eq(user_id), eq(5))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        generation_repo
            .expect_update()
            .withf(move |id, changeset| {
                *id == generation_id
                    && changeset.status.as_deref() == Some("failed")
                    && changeset.error_message.as_deref() == Some("boom")
            })
            .returning(move |id, _| {
                Box::pin(async move {
                    let mut updated = processing_generation("job_7", 5);
                    updated.id = id;
                    updated.status = "failed".to_string();
                    Ok(updated)
                })
            });

        let usecase =
            GenerationWebhookUseCase::new(Arc::new(generation_repo), Arc::new(profile_repo));

        usecase.reconcile(payload("job_7", "failed")).await.unwrap();
    }

    #[tokio::test]
    async fn completed_callback_records_the_result() {
        let mut generation_repo = MockGenerationRepository::new();

        let entity = processing_generation("job_3", 1);
        let generation_id = entity.id;

        generation_repo
            .expect_find_by_prediction_id()
            .with(eq("job_3"))
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });
        generation_repo
            .expect_update()
            .withf(move |id, changeset| {
                *id == generation_id
                    && changeset.status.as_deref() == Some("completed")
                    && changeset.result_url.as_deref() == Some("https://cdn.example/out.mp4")
                    && changeset.completed_at.is_some()
            })
            .returning(move |id, _| {
                Box::pin(async move {
                    let mut updated = processing_generation("job_3", 1);
                    updated.id = id;
                    updated.status = "completed".to_string();
                    Ok(updated)
                })
            });

        let usecase = GenerationWebhookUseCase::new(
            Arc::new(generation_repo),
            Arc::new(MockProfileRepository::new()),
        );

        usecase
            .reconcile(payload("job_3", "completed"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn replayed_terminal_callback_does_not_refund_again() {
        let mut generation_repo = MockGenerationRepository::new();

        let mut entity = processing_generation("job_7", 5);
        entity.status = "failed".to_string();

        generation_repo
            .expect_find_by_prediction_id()
            .with(eq("job_7"))
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });
        // No add_credits/update expectations: a second refund would fail here.

        let usecase = GenerationWebhookUseCase::new(
            Arc::new(generation_repo),
            Arc::new(MockProfileRepository::new()),
        );

        usecase.reconcile(payload("job_7", "failed")).await.unwrap();
    }

    #[tokio::test]
    async fn unrecognized_status_is_a_no_op() {
        let mut generation_repo = MockGenerationRepository::new();

        let entity = processing_generation("job_5", 1);
        generation_repo
            .expect_find_by_prediction_id()
            .with(eq("job_5"))
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });

        let usecase = GenerationWebhookUseCase::new(
            Arc::new(generation_repo),
            Arc::new(MockProfileRepository::new()),
        );

        usecase
            .reconcile(payload("job_5", "queueing"))
            .await
            .unwrap();
    }
}
