use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::{
    entities::generations::{InsertGenerationEntity, UpdateGenerationEntity},
    repositories::{
        ai::AiGateway, generations::GenerationRepository, profiles::ProfileRepository,
    },
    value_objects::{
        ai::{AI_STATUS_COMPLETED, AI_STATUS_FAILED, AiJobRequest},
        enums::{
            generation_statuses::GenerationStatus,
            generation_types::GenerationType,
        },
        generations::{GenerationDto, GenerationRequest},
    },
};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("generation not found")]
    NotFound,
    #[error("generation belongs to another user")]
    Forbidden,
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("generation service is unavailable")]
    Upstream(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GenerationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GenerationError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            GenerationError::NotFound => StatusCode::NOT_FOUND,
            GenerationError::Forbidden => StatusCode::FORBIDDEN,
            GenerationError::Invalid(_) => StatusCode::BAD_REQUEST,
            GenerationError::Upstream(_) | GenerationError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Credit-metered submission of enhancement/animation jobs, plus the
/// client-driven status poll. Every failure branch after the credit deduction
/// compensates with a refund; every failure before it deletes the record.
pub struct GenerationUseCase<G, P, A>
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    A: AiGateway + Send + Sync + 'static,
{
    generation_repo: Arc<G>,
    profile_repo: Arc<P>,
    ai_client: Arc<A>,
}

impl<G, P, A> GenerationUseCase<G, P, A>
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    A: AiGateway + Send + Sync + 'static,
{
    pub fn new(generation_repo: Arc<G>, profile_repo: Arc<P>, ai_client: Arc<A>) -> Self {
        Self {
            generation_repo,
            profile_repo,
            ai_client,
        }
    }

    pub async fn submit(
        &self,
        user: &AuthUser,
        task_type: GenerationType,
        request: GenerationRequest,
    ) -> GenerationResult<GenerationDto> {
        let image_url = request
            .image_url
            .clone()
            .ok_or_else(|| GenerationError::Invalid("image_url is required".to_string()))?;

        let cost = task_type.credit_cost();
        info!(
            user_id = %user.user_id,
            task_type = %task_type,
            cost,
            "generation: submission requested"
        );

        let profile = self
            .profile_repo
            .find_by_id(user.user_id)
            .await
            .map_err(|err| {
                error!(user_id = %user.user_id, db_error = ?err, "generation: failed to load profile");
                GenerationError::Internal(err)
            })?
            .ok_or(GenerationError::NotFound)?;

        if profile.credits < cost {
            warn!(
                user_id = %user.user_id,
                balance = profile.credits,
                cost,
                "generation: insufficient credits"
            );
            return Err(GenerationError::InsufficientCredits);
        }

        let generation = self
            .generation_repo
            .insert(InsertGenerationEntity {
                user_id: user.user_id,
                type_: task_type.to_string(),
                status: GenerationStatus::Processing.to_string(),
                original_image_url: Some(image_url.clone()),
                prompt: request.prompt.clone(),
                settings: request.settings.clone(),
                credits_used: cost,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(user_id = %user.user_id, db_error = ?err, "generation: failed to create record");
                GenerationError::Internal(err)
            })?;
        let generation_id = generation.id;

        // Deduction is the point of no return. A short balance (or a failed
        // statement) leaves no trace: the record created above is removed.
        let deducted = match self.profile_repo.deduct_credits(user.user_id, cost).await {
            Ok(deducted) => deducted,
            Err(err) => {
                error!(
                    user_id = %user.user_id,
                    %generation_id,
                    db_error = ?err,
                    "generation: credit deduction errored"
                );
                self.delete_generation_best_effort(generation_id).await;
                return Err(GenerationError::Internal(err));
            }
        };

        if !deducted {
            warn!(
                user_id = %user.user_id,
                %generation_id,
                "generation: balance changed under us, rolling back record"
            );
            self.delete_generation_best_effort(generation_id).await;
            return Err(GenerationError::InsufficientCredits);
        }

        let job_id = match self
            .ai_client
            .submit_job(AiJobRequest {
                task_type,
                image_url: Some(image_url),
                prompt: request.prompt,
                settings: request.settings,
            })
            .await
        {
            Ok(job_id) => job_id,
            Err(err) => {
                error!(
                    user_id = %user.user_id,
                    %generation_id,
                    error = ?err,
                    "generation: job submission failed, refunding"
                );
                self.refund_and_fail(user.user_id, generation_id, cost, &err.to_string())
                    .await;
                return Err(GenerationError::Upstream(err));
            }
        };

        let updated = match self
            .generation_repo
            .update(
                generation_id,
                UpdateGenerationEntity {
                    replicate_prediction_id: Some(job_id.clone()),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                // The provider job keeps running untracked; the user is made
                // whole and the record marked failed.
                error!(
                    user_id = %user.user_id,
                    %generation_id,
                    job_id,
                    db_error = ?err,
                    "generation: failed to persist job id, refunding"
                );
                self.refund_and_fail(
                    user.user_id,
                    generation_id,
                    cost,
                    "failed to track generation job",
                )
                .await;
                return Err(GenerationError::Internal(err));
            }
        };

        info!(
            user_id = %user.user_id,
            %generation_id,
            job_id,
            "generation: job submitted"
        );
        Ok(GenerationDto::from(updated))
    }

    /// Re-checks a still-processing generation with the provider. Missed
    /// webhooks surface here because the client keeps polling.
    pub async fn poll(&self, user: &AuthUser, generation_id: Uuid) -> GenerationResult<GenerationDto> {
        let generation = self
            .generation_repo
            .find_by_id(generation_id)
            .await
            .map_err(|err| {
                error!(%generation_id, db_error = ?err, "generation: failed to load record");
                GenerationError::Internal(err)
            })?
            .ok_or(GenerationError::NotFound)?;

        if generation.user_id != user.user_id {
            warn!(
                %generation_id,
                user_id = %user.user_id,
                owner = %generation.user_id,
                "generation: poll from non-owner"
            );
            return Err(GenerationError::Forbidden);
        }

        let status = GenerationStatus::from_str(&generation.status);
        let job_id = match (&status, generation.replicate_prediction_id.as_deref()) {
            (Some(GenerationStatus::Processing), Some(job_id)) => job_id.to_string(),
            _ => return Ok(GenerationDto::from(generation)),
        };

        let snapshot = match self.ai_client.fetch_job(&job_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                // The poll is best-effort; the stored row is still the truth.
                warn!(%generation_id, job_id, error = ?err, "generation: provider poll failed");
                return Ok(GenerationDto::from(generation));
            }
        };

        match snapshot.status.as_str() {
            AI_STATUS_COMPLETED => {
                let updated = self
                    .generation_repo
                    .update(
                        generation_id,
                        UpdateGenerationEntity {
                            status: Some(GenerationStatus::Completed.to_string()),
                            result_url: snapshot.result_url,
                            completed_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|err| {
                        error!(%generation_id, db_error = ?err, "generation: failed to record completion");
                        GenerationError::Internal(err)
                    })?;
                info!(%generation_id, "generation: completed via poll");
                Ok(GenerationDto::from(updated))
            }
            AI_STATUS_FAILED => {
                // Refund only from a non-terminal state so a webhook that
                // already settled the job cannot be refunded twice.
                if generation.credits_used > 0 {
                    self.profile_repo
                        .add_credits(generation.user_id, generation.credits_used)
                        .await
                        .map_err(|err| {
                            error!(
                                %generation_id,
                                db_error = ?err,
                                "generation: refund failed during poll"
                            );
                            GenerationError::Internal(err)
                        })?;
                }

                let updated = self
                    .generation_repo
                    .update(
                        generation_id,
                        UpdateGenerationEntity {
                            status: Some(GenerationStatus::Failed.to_string()),
                            error_message: snapshot.error,
                            completed_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|err| {
                        error!(%generation_id, db_error = ?err, "generation: failed to record failure");
                        GenerationError::Internal(err)
                    })?;
                info!(%generation_id, "generation: failed via poll, credits refunded");
                Ok(GenerationDto::from(updated))
            }
            _ => Ok(GenerationDto::from(generation)),
        }
    }

    async fn delete_generation_best_effort(&self, generation_id: Uuid) {
        if let Err(err) = self.generation_repo.delete(generation_id).await {
            error!(
                %generation_id,
                db_error = ?err,
                "generation: failed to remove orphaned record"
            );
        }
    }

    async fn refund_and_fail(&self, user_id: Uuid, generation_id: Uuid, cost: i32, message: &str) {
        if let Err(err) = self.profile_repo.add_credits(user_id, cost).await {
            error!(
                %user_id,
                %generation_id,
                db_error = ?err,
                "generation: refund failed, balance is short"
            );
        }

        if let Err(err) = self
            .generation_repo
            .update(
                generation_id,
                UpdateGenerationEntity {
                    status: Some(GenerationStatus::Failed.to_string()),
                    error_message: Some(message.to_string()),
                    completed_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
        {
            error!(
                %generation_id,
                db_error = ?err,
                "generation: failed to mark record failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::generations::GenerationEntity;
    use crate::domain::entities::profiles::ProfileEntity;
    use crate::domain::repositories::{
        ai::MockAiGateway, generations::MockGenerationRepository, profiles::MockProfileRepository,
    };
    use crate::domain::value_objects::ai::AiJobSnapshot;
    use mockall::predicate::eq;

    fn auth_user(user_id: Uuid) -> AuthUser {
        AuthUser {
            user_id,
            email: None,
            role: "authenticated".to_string(),
        }
    }

    fn profile_with_credits(user_id: Uuid, credits: i32) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id: user_id,
            email: "user@example.com".to_string(),
            full_name: None,
            is_admin: false,
            credits,
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn generation(user_id: Uuid, entity: InsertGenerationEntity) -> GenerationEntity {
        GenerationEntity {
            id: Uuid::new_v4(),
            user_id,
            type_: entity.type_,
            status: entity.status,
            original_image_url: entity.original_image_url,
            prompt: entity.prompt,
            settings: entity.settings,
            credits_used: entity.credits_used,
            replicate_prediction_id: None,
            result_url: None,
            error_message: None,
            completed_at: None,
            created_at: entity.created_at,
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            image_url: Some("https://cdn.example/photo.jpg".to_string()),
            prompt: Some("restore this".to_string()),
            settings: None,
        }
    }

    #[tokio::test]
    async fn short_balance_writes_nothing() {
        let user_id = Uuid::new_v4();

        let mut profile_repo = MockProfileRepository::new();
        profile_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                Box::pin(async move { Ok(Some(profile_with_credits(user_id, 3))) })
            });
        // No insert/deduct expectations: the 402 path must not touch them.

        let usecase = GenerationUseCase::new(
            Arc::new(MockGenerationRepository::new()),
            Arc::new(profile_repo),
            Arc::new(MockAiGateway::new()),
        );

        let result = usecase
            .submit(&auth_user(user_id), GenerationType::VideoGenerate, request())
            .await;

        assert!(matches!(result, Err(GenerationError::InsufficientCredits)));
    }

    #[tokio::test]
    async fn failed_deduction_deletes_the_record() {
        let user_id = Uuid::new_v4();

        let mut profile_repo = MockProfileRepository::new();
        let mut generation_repo = MockGenerationRepository::new();

        profile_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                Box::pin(async move { Ok(Some(profile_with_credits(user_id, 10))) })
            });

        let created_id = Arc::new(std::sync::Mutex::new(None::<Uuid>));
        let created_id_clone = Arc::clone(&created_id);
        generation_repo.expect_insert().returning(move |entity| {
            let created = generation(user_id, entity);
            *created_id_clone.lock().unwrap() = Some(created.id);
            Box::pin(async move { Ok(created) })
        });

        // Concurrent spend drained the balance between check and deduct.
        profile_repo
            .expect_deduct_credits()
            .with(eq(user_id), eq(1))
            .returning(|_, _| Box::pin(async { Ok(false) }));

        let created_id_check = Arc::clone(&created_id);
        generation_repo
            .expect_delete()
            .withf(move |id| Some(*id) == *created_id_check.lock().unwrap())
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = GenerationUseCase::new(
            Arc::new(generation_repo),
            Arc::new(profile_repo),
            Arc::new(MockAiGateway::new()),
        );

        let result = usecase
            .submit(&auth_user(user_id), GenerationType::ImageEnhance, request())
            .await;

        assert!(matches!(result, Err(GenerationError::InsufficientCredits)));
    }

    #[tokio::test]
    async fn failed_submission_refunds_the_deduction() {
        let user_id = Uuid::new_v4();

        let mut profile_repo = MockProfileRepository::new();
        let mut generation_repo = MockGenerationRepository::new();
        let mut ai_client = MockAiGateway::new();

        profile_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                Box::pin(async move { Ok(Some(profile_with_credits(user_id, 10))) })
            });
        generation_repo.expect_insert().returning(move |entity| {
            let created = generation(user_id, entity);
            Box::pin(async move { Ok(created) })
        });
        profile_repo
            .expect_deduct_credits()
            .with(eq(user_id), eq(5))
            .returning(|_, _| Box::pin(async { Ok(true) }));

        ai_client
            .expect_submit_job()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("provider is down")) }));

        // The refund must return exactly what was deducted.
        profile_repo
            .expect_add_credits()
            .with(eq(user_id), eq(5))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        generation_repo
            .expect_update()
            .withf(|_, changeset| changeset.status.as_deref() == Some("failed"))
            .returning(move |id, changeset| {
                Box::pin(async move {
                    let mut entity = generation(
                        user_id,
                        InsertGenerationEntity {
                            user_id,
                            type_: "video_generate".to_string(),
                            status: "failed".to_string(),
                            original_image_url: None,
                            prompt: None,
                            settings: None,
                            credits_used: 5,
                            created_at: Utc::now(),
                        },
                    );
                    entity.id = id;
                    entity.error_message = changeset.error_message;
                    Ok(entity)
                })
            });

        let usecase = GenerationUseCase::new(
            Arc::new(generation_repo),
            Arc::new(profile_repo),
            Arc::new(ai_client),
        );

        let result = usecase
            .submit(&auth_user(user_id), GenerationType::VideoGenerate, request())
            .await;

        assert!(matches!(result, Err(GenerationError::Upstream(_))));
    }

    #[tokio::test]
    async fn successful_submission_records_the_job_id() {
        let user_id = Uuid::new_v4();

        let mut profile_repo = MockProfileRepository::new();
        let mut generation_repo = MockGenerationRepository::new();
        let mut ai_client = MockAiGateway::new();

        profile_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                Box::pin(async move { Ok(Some(profile_with_credits(user_id, 10))) })
            });
        generation_repo.expect_insert().returning(move |entity| {
            let created = generation(user_id, entity);
            Box::pin(async move { Ok(created) })
        });
        profile_repo
            .expect_deduct_credits()
            .with(eq(user_id), eq(1))
            .returning(|_, _| Box::pin(async { Ok(true) }));
        ai_client
            .expect_submit_job()
            .returning(|_| Box::pin(async { Ok("job_123".to_string()) }));
        generation_repo
            .expect_update()
            .withf(|_, changeset| {
                changeset.replicate_prediction_id.as_deref() == Some("job_123")
                    && changeset.status.is_none()
            })
            .returning(move |id, changeset| {
                Box::pin(async move {
                    let mut entity = generation(
                        user_id,
                        InsertGenerationEntity {
                            user_id,
                            type_: "image_enhance".to_string(),
                            status: "processing".to_string(),
                            original_image_url: None,
                            prompt: None,
                            settings: None,
                            credits_used: 1,
                            created_at: Utc::now(),
                        },
                    );
                    entity.id = id;
                    entity.replicate_prediction_id = changeset.replicate_prediction_id;
                    Ok(entity)
                })
            });

        let usecase = GenerationUseCase::new(
            Arc::new(generation_repo),
            Arc::new(profile_repo),
            Arc::new(ai_client),
        );

        let dto = usecase
            .submit(&auth_user(user_id), GenerationType::ImageEnhance, request())
            .await
            .unwrap();

        assert_eq!(dto.status, "processing");
        assert_eq!(dto.credits_used, 1);
    }

    #[tokio::test]
    async fn poll_refunds_once_when_provider_reports_failure() {
        let user_id = Uuid::new_v4();
        let generation_id = Uuid::new_v4();

        let mut profile_repo = MockProfileRepository::new();
        let mut generation_repo = MockGenerationRepository::new();
        let mut ai_client = MockAiGateway::new();

        let mut entity = generation(
            user_id,
            InsertGenerationEntity {
                user_id,
                type_: "video_generate".to_string(),
                status: "processing".to_string(),
                original_image_url: None,
                prompt: None,
                settings: None,
                credits_used: 5,
                created_at: Utc::now(),
            },
        );
        entity.id = generation_id;
        entity.replicate_prediction_id = Some("job_9".to_string());

        generation_repo
            .expect_find_by_id()
            .with(eq(generation_id))
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });
        ai_client
            .expect_fetch_job()
            .with(eq("job_9"))
            .returning(|job_id| {
                let job_id = job_id.to_string();
                Box::pin(async move {
                    Ok(AiJobSnapshot {
                        job_id,
                        status: "failed".to_string(),
                        result_url: None,
                        error: Some("render crashed".to_string()),
                    })
                })
            });
        profile_repo
            .expect_add_credits()
            .with(eq(user_id), eq(5))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        generation_repo
            .expect_update()
            .withf(|_, changeset| changeset.status.as_deref() == Some("failed"))
            .returning(move |id, changeset| {
                Box::pin(async move {
                    let mut updated = generation(
                        user_id,
                        InsertGenerationEntity {
                            user_id,
                            type_: "video_generate".to_string(),
                            status: "failed".to_string(),
                            original_image_url: None,
                            prompt: None,
                            settings: None,
                            credits_used: 5,
                            created_at: Utc::now(),
                        },
                    );
                    updated.id = id;
                    updated.error_message = changeset.error_message;
                    Ok(updated)
                })
            });

        let usecase = GenerationUseCase::new(
            Arc::new(generation_repo),
            Arc::new(profile_repo),
            Arc::new(ai_client),
        );

        let dto = usecase
            .poll(&auth_user(user_id), generation_id)
            .await
            .unwrap();

        assert_eq!(dto.status, "failed");
    }

    #[tokio::test]
    async fn poll_of_terminal_generation_is_read_only() {
        let user_id = Uuid::new_v4();
        let generation_id = Uuid::new_v4();

        let mut generation_repo = MockGenerationRepository::new();

        let mut entity = generation(
            user_id,
            InsertGenerationEntity {
                user_id,
                type_: "image_enhance".to_string(),
                status: "completed".to_string(),
                original_image_url: None,
                prompt: None,
                settings: None,
                credits_used: 1,
                created_at: Utc::now(),
            },
        );
        entity.id = generation_id;
        entity.replicate_prediction_id = Some("job_1".to_string());

        generation_repo
            .expect_find_by_id()
            .with(eq(generation_id))
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });
        // No gateway/update/refund expectations: terminal rows are immutable.

        let usecase = GenerationUseCase::new(
            Arc::new(generation_repo),
            Arc::new(MockProfileRepository::new()),
            Arc::new(MockAiGateway::new()),
        );

        let dto = usecase
            .poll(&auth_user(user_id), generation_id)
            .await
            .unwrap();

        assert_eq!(dto.status, "completed");
    }
}
