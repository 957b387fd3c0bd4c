use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::config_model::Email as EmailConfig;
use crate::domain::{
    entities::support_tickets::InsertSupportTicketEntity,
    repositories::{
        email::EmailSender, newsletter_signups::NewsletterSignupRepository,
        support_tickets::SupportTicketRepository,
    },
    value_objects::{email::EmailMessage, enums::ticket_subjects::TicketSubject},
};

#[derive(Debug, Error)]
pub enum SupportError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SupportError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SupportError::Validation(_) => StatusCode::BAD_REQUEST,
            SupportError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type SupportResult<T> = std::result::Result<T, SupportError>;

#[derive(Debug, Clone, Deserialize)]
pub struct SupportTicketRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub order_id: Option<Uuid>,
}

fn looks_like_email(value: &str) -> bool {
    value.contains('@') && value.len() >= 5 && !value.contains(char::is_whitespace)
}

/// Support tickets and the newsletter opt-in. Notification emails are a
/// courtesy: their failure never fails the ticket.
pub struct SupportUseCase<S, N, E>
where
    S: SupportTicketRepository + Send + Sync + 'static,
    N: NewsletterSignupRepository + Send + Sync + 'static,
    E: EmailSender + Send + Sync + 'static,
{
    support_ticket_repo: Arc<S>,
    newsletter_repo: Arc<N>,
    email_client: Arc<E>,
    email_config: EmailConfig,
}

impl<S, N, E> SupportUseCase<S, N, E>
where
    S: SupportTicketRepository + Send + Sync + 'static,
    N: NewsletterSignupRepository + Send + Sync + 'static,
    E: EmailSender + Send + Sync + 'static,
{
    pub fn new(
        support_ticket_repo: Arc<S>,
        newsletter_repo: Arc<N>,
        email_client: Arc<E>,
        email_config: EmailConfig,
    ) -> Self {
        Self {
            support_ticket_repo,
            newsletter_repo,
            email_client,
            email_config,
        }
    }

    pub async fn submit_ticket(&self, request: SupportTicketRequest) -> SupportResult<Uuid> {
        let name = request.name.trim();
        let email = request.email.trim().to_lowercase();
        let message = request.message.trim();

        if name.is_empty() {
            return Err(SupportError::Validation("name is required".to_string()));
        }
        if !looks_like_email(&email) {
            return Err(SupportError::Validation("a valid email is required".to_string()));
        }
        if message.is_empty() {
            return Err(SupportError::Validation("message is required".to_string()));
        }
        let subject = TicketSubject::from_str(&request.subject).ok_or_else(|| {
            SupportError::Validation(format!("unknown subject: {}", request.subject))
        })?;

        let ticket_id = self
            .support_ticket_repo
            .insert(InsertSupportTicketEntity {
                name: name.to_string(),
                email: email.clone(),
                subject: subject.to_string(),
                message: message.to_string(),
                order_id: request.order_id,
                status: "open".to_string(),
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "support: failed to create ticket");
                SupportError::Internal(err)
            })?;

        let team_notification = EmailMessage {
            to: self.email_config.support_inbox.clone(),
            subject: format!("[support] {} from {}", subject, email),
            html: format!(
                "<p><strong>{}</strong> ({}) wrote:</p><p>{}</p><p>ticket: {}</p>",
                name, email, message, ticket_id
            ),
        };
        let acknowledgement = EmailMessage {
            to: email.clone(),
            subject: "We received your message".to_string(),
            html: format!(
                "<p>Hi {},</p><p>Thanks for reaching out. We will reply within one \
                 business day.</p>",
                name
            ),
        };

        // Both notifications go out together; either one failing is logged
        // and swallowed.
        let (team_result, ack_result) = tokio::join!(
            self.email_client.send(team_notification),
            self.email_client.send(acknowledgement),
        );
        if let Err(err) = team_result {
            warn!(%ticket_id, error = ?err, "support: team notification failed");
        }
        if let Err(err) = ack_result {
            warn!(%ticket_id, error = ?err, "support: acknowledgement email failed");
        }

        info!(%ticket_id, subject = %subject, "support: ticket created");
        Ok(ticket_id)
    }

    pub async fn newsletter_signup(&self, email: &str) -> SupportResult<()> {
        let email = email.trim().to_lowercase();
        if !looks_like_email(&email) {
            return Err(SupportError::Validation("a valid email is required".to_string()));
        }

        self.newsletter_repo.upsert(&email).await.map_err(|err| {
            error!(email, db_error = ?err, "support: newsletter signup failed");
            SupportError::Internal(err)
        })?;

        info!(email, "support: newsletter signup stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{
        email::MockEmailSender, newsletter_signups::MockNewsletterSignupRepository,
        support_tickets::MockSupportTicketRepository,
    };
    use mockall::predicate::eq;

    fn email_config() -> EmailConfig {
        EmailConfig {
            api_key: "re_test".to_string(),
            from_address: "hello@giftingmoments.example".to_string(),
            support_inbox: "support@giftingmoments.example".to_string(),
        }
    }

    fn request(subject: &str) -> SupportTicketRequest {
        SupportTicketRequest {
            name: "Alex".to_string(),
            email: "alex@example.com".to_string(),
            subject: subject.to_string(),
            message: "My video looks great, thank you!".to_string(),
            order_id: None,
        }
    }

    #[tokio::test]
    async fn valid_ticket_is_stored_and_both_emails_sent() {
        let mut ticket_repo = MockSupportTicketRepository::new();
        let mut email_client = MockEmailSender::new();

        ticket_repo
            .expect_insert()
            .withf(|entity| entity.subject == "feedback" && entity.status == "open")
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
        email_client
            .expect_send()
            .times(2)
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = SupportUseCase::new(
            Arc::new(ticket_repo),
            Arc::new(MockNewsletterSignupRepository::new()),
            Arc::new(email_client),
            email_config(),
        );

        usecase.submit_ticket(request("feedback")).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_subject_is_rejected_before_insert() {
        let usecase = SupportUseCase::new(
            Arc::new(MockSupportTicketRepository::new()),
            Arc::new(MockNewsletterSignupRepository::new()),
            Arc::new(MockEmailSender::new()),
            email_config(),
        );

        let result = usecase.submit_ticket(request("complaint")).await;
        assert!(matches!(result, Err(SupportError::Validation(_))));
    }

    #[tokio::test]
    async fn email_failures_do_not_fail_the_ticket() {
        let mut ticket_repo = MockSupportTicketRepository::new();
        let mut email_client = MockEmailSender::new();

        ticket_repo
            .expect_insert()
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
        email_client
            .expect_send()
            .times(2)
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("smtp down")) }));

        let usecase = SupportUseCase::new(
            Arc::new(ticket_repo),
            Arc::new(MockNewsletterSignupRepository::new()),
            Arc::new(email_client),
            email_config(),
        );

        usecase.submit_ticket(request("other")).await.unwrap();
    }

    #[tokio::test]
    async fn newsletter_signup_normalizes_the_address() {
        let mut newsletter_repo = MockNewsletterSignupRepository::new();
        newsletter_repo
            .expect_upsert()
            .with(eq("reader@example.com"))
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = SupportUseCase::new(
            Arc::new(MockSupportTicketRepository::new()),
            Arc::new(newsletter_repo),
            Arc::new(MockEmailSender::new()),
            email_config(),
        );

        usecase
            .newsletter_signup("  Reader@Example.com ")
            .await
            .unwrap();
    }
}
