use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use crate::application::usecases::checkout::{CheckoutUseCase, PendingCheckoutUseCase};
use crate::auth::AuthUser;
use crate::domain::repositories::{
    payments::StripeGateway, pending_checkouts::PendingCheckoutRepository,
    transactions::TransactionRepository,
};
use crate::infrastructure::axum_http::error_responses::{bad_request, usecase_error};
use crate::infrastructure::payments::stripe_client::StripeClient;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        pending_checkouts::PendingCheckoutPostgres, transactions::TransactionPostgres,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, stripe_client: Arc<StripeClient>) -> Router {
    let transaction_repository = Arc::new(TransactionPostgres::new(Arc::clone(&db_pool)));
    let pending_checkout_repository =
        Arc::new(PendingCheckoutPostgres::new(Arc::clone(&db_pool)));

    let checkout_usecase = CheckoutUseCase::new(transaction_repository, stripe_client);
    let pending_checkout_usecase = PendingCheckoutUseCase::new(pending_checkout_repository);

    Router::new()
        .route("/api/stripe/checkout", post(create_credit_checkout))
        .with_state(Arc::new(checkout_usecase))
        .merge(
            Router::new()
                .route(
                    "/api/checkout/pending",
                    get(lookup_pending_checkout)
                        .post(store_pending_checkout)
                        .delete(clear_pending_checkout),
                )
                .with_state(Arc::new(pending_checkout_usecase)),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutBody {
    #[serde(rename = "packageId")]
    pub package_id: String,
}

pub async fn create_credit_checkout<T, S>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<T, S>>>,
    user: AuthUser,
    Json(body): Json<CreateCheckoutBody>,
) -> impl IntoResponse
where
    T: TransactionRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match checkout_usecase
        .create_credit_checkout(&user, &body.package_id)
        .await
    {
        Ok(url) => (StatusCode::OK, Json(json!({ "url": url }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

#[derive(Debug, Deserialize)]
pub struct StorePendingCheckoutBody {
    pub email: String,
    pub session_id: String,
}

/// Called at magic-link send time, before the buyer has a session. The bridge
/// is best-effort by design, so this never reports a storage failure.
pub async fn store_pending_checkout<PC>(
    State(pending_checkout_usecase): State<Arc<PendingCheckoutUseCase<PC>>>,
    Json(body): Json<StorePendingCheckoutBody>,
) -> impl IntoResponse
where
    PC: PendingCheckoutRepository + Send + Sync + 'static,
{
    if body.email.trim().is_empty() || body.session_id.trim().is_empty() {
        return bad_request("email and session_id are required");
    }

    pending_checkout_usecase
        .store(body.email.trim(), body.session_id.trim())
        .await;

    (StatusCode::OK, Json(json!({ "success": true }))).into_response()
}

pub async fn lookup_pending_checkout<PC>(
    State(pending_checkout_usecase): State<Arc<PendingCheckoutUseCase<PC>>>,
    user: AuthUser,
) -> impl IntoResponse
where
    PC: PendingCheckoutRepository + Send + Sync + 'static,
{
    let Some(email) = user.email.as_deref() else {
        return (StatusCode::OK, Json(json!({ "session_id": null }))).into_response();
    };

    let session_id = pending_checkout_usecase.lookup(email).await;
    (StatusCode::OK, Json(json!({ "session_id": session_id }))).into_response()
}

pub async fn clear_pending_checkout<PC>(
    State(pending_checkout_usecase): State<Arc<PendingCheckoutUseCase<PC>>>,
    user: AuthUser,
) -> impl IntoResponse
where
    PC: PendingCheckoutRepository + Send + Sync + 'static,
{
    if let Some(email) = user.email.as_deref() {
        pending_checkout_usecase.clear(email).await;
    }

    (StatusCode::OK, Json(json!({ "success": true }))).into_response()
}
