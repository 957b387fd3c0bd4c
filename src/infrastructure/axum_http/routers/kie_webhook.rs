use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use serde_json::json;

use crate::application::usecases::generation_webhook::GenerationWebhookUseCase;
use crate::domain::repositories::{
    generations::GenerationRepository, profiles::ProfileRepository,
};
use crate::domain::value_objects::ai::AiWebhookPayload;
use crate::infrastructure::axum_http::error_responses::usecase_error;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{generations::GenerationPostgres, profiles::ProfilePostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let generation_repository = Arc::new(GenerationPostgres::new(Arc::clone(&db_pool)));
    let profile_repository = Arc::new(ProfilePostgres::new(Arc::clone(&db_pool)));

    let generation_webhook_usecase =
        GenerationWebhookUseCase::new(generation_repository, profile_repository);

    Router::new()
        .route("/api/webhooks/kie", post(handle_kie_webhook))
        .with_state(Arc::new(generation_webhook_usecase))
}

pub async fn handle_kie_webhook<G, P>(
    State(generation_webhook_usecase): State<Arc<GenerationWebhookUseCase<G, P>>>,
    Json(payload): Json<AiWebhookPayload>,
) -> impl IntoResponse
where
    G: GenerationRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    match generation_webhook_usecase.reconcile(payload).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "received": true }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}
