use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::application::usecases::{
    interview::InterviewUseCase,
    order_claim::OrderClaimUseCase,
};
use crate::auth::AuthUser;
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{
    orders::OrderRepository, payments::StripeGateway,
    pending_checkouts::PendingCheckoutRepository,
};
use crate::domain::value_objects::orders::{ClaimOrderRequest, InterviewPatch};
use crate::infrastructure::axum_http::error_responses::usecase_error;
use crate::infrastructure::payments::stripe_client::StripeClient;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{orders::OrderPostgres, pending_checkouts::PendingCheckoutPostgres},
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    config: &DotEnvyConfig,
) -> Router {
    let order_repository = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let pending_checkout_repository =
        Arc::new(PendingCheckoutPostgres::new(Arc::clone(&db_pool)));

    let claim_usecase = OrderClaimUseCase::new(
        Arc::clone(&order_repository),
        pending_checkout_repository,
        stripe_client,
        config.stripe.clone(),
    );
    let interview_usecase = InterviewUseCase::new(order_repository);

    Router::new()
        .route("/api/orders/claim", post(claim))
        .with_state(Arc::new(claim_usecase))
        .merge(
            Router::new()
                .route("/api/orders/:id/interview", patch(autosave_interview))
                .with_state(Arc::new(interview_usecase)),
        )
}

pub async fn claim<O, PC, S>(
    State(claim_usecase): State<Arc<OrderClaimUseCase<O, PC, S>>>,
    user: AuthUser,
    Json(request): Json<ClaimOrderRequest>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    PC: PendingCheckoutRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match claim_usecase.claim(&user, request).await {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

#[derive(Debug, Deserialize)]
pub struct InterviewAutosaveBody {
    #[serde(default)]
    pub interview_data: InterviewPatch,
    pub step: Option<i32>,
}

pub async fn autosave_interview<O>(
    State(interview_usecase): State<Arc<InterviewUseCase<O>>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(body): Json<InterviewAutosaveBody>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
{
    let mut patch = body.interview_data;
    if body.step.is_some() {
        patch.step = body.step;
    }

    match interview_usecase.autosave(&user, order_id, patch).await {
        Ok(order) => (StatusCode::OK, Json(json!({ "order": order }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}
