use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use serde::Deserialize;
use serde_json::json;

use crate::application::usecases::support::{SupportTicketRequest, SupportUseCase};
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{
    email::EmailSender, newsletter_signups::NewsletterSignupRepository,
    support_tickets::SupportTicketRepository,
};
use crate::infrastructure::axum_http::error_responses::usecase_error;
use crate::infrastructure::email::resend_client::ResendClient;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        newsletter_signups::NewsletterSignupPostgres, support_tickets::SupportTicketPostgres,
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    email_client: Arc<ResendClient>,
    config: &DotEnvyConfig,
) -> Router {
    let support_ticket_repository = Arc::new(SupportTicketPostgres::new(Arc::clone(&db_pool)));
    let newsletter_repository = Arc::new(NewsletterSignupPostgres::new(Arc::clone(&db_pool)));

    let support_usecase = SupportUseCase::new(
        support_ticket_repository,
        newsletter_repository,
        email_client,
        config.email.clone(),
    );

    Router::new()
        .route("/api/support", post(submit_ticket))
        .route("/api/newsletter", post(newsletter_signup))
        .with_state(Arc::new(support_usecase))
}

pub async fn submit_ticket<S, N, E>(
    State(support_usecase): State<Arc<SupportUseCase<S, N, E>>>,
    Json(request): Json<SupportTicketRequest>,
) -> impl IntoResponse
where
    S: SupportTicketRepository + Send + Sync + 'static,
    N: NewsletterSignupRepository + Send + Sync + 'static,
    E: EmailSender + Send + Sync + 'static,
{
    match support_usecase.submit_ticket(request).await {
        Ok(ticket_id) => (
            StatusCode::OK,
            Json(json!({ "success": true, "ticket_id": ticket_id })),
        )
            .into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}

#[derive(Debug, Deserialize)]
pub struct NewsletterSignupBody {
    pub email: String,
}

pub async fn newsletter_signup<S, N, E>(
    State(support_usecase): State<Arc<SupportUseCase<S, N, E>>>,
    Json(body): Json<NewsletterSignupBody>,
) -> impl IntoResponse
where
    S: SupportTicketRepository + Send + Sync + 'static,
    N: NewsletterSignupRepository + Send + Sync + 'static,
    E: EmailSender + Send + Sync + 'static,
{
    match support_usecase.newsletter_signup(&body.email).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => usecase_error(err.status_code(), err),
    }
}
