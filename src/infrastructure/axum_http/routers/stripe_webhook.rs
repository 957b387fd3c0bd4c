use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::application::usecases::stripe_webhook::StripeWebhookUseCase;
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{
    email::EmailSender, orders::OrderRepository, payments::StripeGateway,
    profiles::ProfileRepository, transactions::TransactionRepository,
};
use crate::infrastructure::axum_http::error_responses::{bad_request, usecase_error};
use crate::infrastructure::email::resend_client::ResendClient;
use crate::infrastructure::payments::stripe_client::StripeClient;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        orders::OrderPostgres, profiles::ProfilePostgres, transactions::TransactionPostgres,
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    email_client: Arc<ResendClient>,
    config: &DotEnvyConfig,
) -> Router {
    let order_repository = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let profile_repository = Arc::new(ProfilePostgres::new(Arc::clone(&db_pool)));
    let transaction_repository = Arc::new(TransactionPostgres::new(Arc::clone(&db_pool)));

    let stripe_webhook_usecase = StripeWebhookUseCase::new(
        order_repository,
        profile_repository,
        transaction_repository,
        stripe_client,
        email_client,
        config.stripe.clone(),
        config.app.clone(),
    );

    Router::new()
        .route("/api/webhooks/stripe", post(handle_stripe_webhook))
        .with_state(Arc::new(stripe_webhook_usecase))
}

pub async fn handle_stripe_webhook<O, P, T, S, E>(
    State(stripe_webhook_usecase): State<Arc<StripeWebhookUseCase<O, P, T, S, E>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
    E: EmailSender + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
    else {
        return bad_request("missing stripe-signature header");
    };

    match stripe_webhook_usecase.handle(&body, signature).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "received": true }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}
