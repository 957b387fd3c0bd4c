use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::usecases::generations::GenerationUseCase;
use crate::auth::AuthUser;
use crate::domain::repositories::{
    ai::AiGateway, generations::GenerationRepository, profiles::ProfileRepository,
};
use crate::domain::value_objects::enums::generation_types::GenerationType;
use crate::domain::value_objects::generations::GenerationRequest;
use crate::infrastructure::ai::kie_client::KieClient;
use crate::infrastructure::axum_http::error_responses::usecase_error;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{generations::GenerationPostgres, profiles::ProfilePostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, kie_client: Arc<KieClient>) -> Router {
    let generation_repository = Arc::new(GenerationPostgres::new(Arc::clone(&db_pool)));
    let profile_repository = Arc::new(ProfilePostgres::new(Arc::clone(&db_pool)));

    let generation_usecase =
        GenerationUseCase::new(generation_repository, profile_repository, kie_client);

    Router::new()
        .route("/api/enhance", post(submit_enhance).get(poll_generation))
        .route("/api/generate", post(submit_generate).get(poll_generation))
        .with_state(Arc::new(generation_usecase))
}

#[derive(Debug, Deserialize)]
pub struct GenerationStatusQuery {
    pub id: Uuid,
}

pub async fn submit_enhance<G, P, A>(
    State(generation_usecase): State<Arc<GenerationUseCase<G, P, A>>>,
    user: AuthUser,
    Json(request): Json<GenerationRequest>,
) -> impl IntoResponse
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    A: AiGateway + Send + Sync + 'static,
{
    match generation_usecase
        .submit(&user, GenerationType::ImageEnhance, request)
        .await
    {
        Ok(generation) => (StatusCode::OK, Json(generation)).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

pub async fn submit_generate<G, P, A>(
    State(generation_usecase): State<Arc<GenerationUseCase<G, P, A>>>,
    user: AuthUser,
    Json(request): Json<GenerationRequest>,
) -> impl IntoResponse
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    A: AiGateway + Send + Sync + 'static,
{
    match generation_usecase
        .submit(&user, GenerationType::VideoGenerate, request)
        .await
    {
        Ok(generation) => (StatusCode::OK, Json(generation)).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

/// Shared by both endpoints: a still-processing record is re-checked with the
/// provider before being returned.
pub async fn poll_generation<G, P, A>(
    State(generation_usecase): State<Arc<GenerationUseCase<G, P, A>>>,
    user: AuthUser,
    Query(query): Query<GenerationStatusQuery>,
) -> impl IntoResponse
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    A: AiGateway + Send + Sync + 'static,
{
    match generation_usecase.poll(&user, query.id).await {
        Ok(generation) => (StatusCode::OK, Json(generation)).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}
