use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::AuthUser;
use crate::domain::{
    entities::{
        pending_checkouts::PendingCheckoutEntity, transactions::InsertTransactionEntity,
    },
    repositories::{
        payments::StripeGateway, pending_checkouts::PendingCheckoutRepository,
        transactions::TransactionRepository,
    },
    value_objects::{
        enums::transaction_statuses::TransactionStatus, payments::find_credit_package,
    },
};

pub const PENDING_CHECKOUT_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("unknown credit package")]
    UnknownPackage,
    #[error("user email is required for checkout")]
    MissingEmail,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckoutError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CheckoutError::UnknownPackage | CheckoutError::MissingEmail => StatusCode::BAD_REQUEST,
            CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CheckoutResult<T> = std::result::Result<T, CheckoutError>;

/// Starts a Stripe Checkout for a credit package and records the pending
/// transaction the payment webhook will later settle.
pub struct CheckoutUseCase<T, S>
where
    T: TransactionRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    transaction_repo: Arc<T>,
    stripe_client: Arc<S>,
}

impl<T, S> CheckoutUseCase<T, S>
where
    T: TransactionRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    pub fn new(transaction_repo: Arc<T>, stripe_client: Arc<S>) -> Self {
        Self {
            transaction_repo,
            stripe_client,
        }
    }

    pub async fn create_credit_checkout(
        &self,
        user: &AuthUser,
        package_id: &str,
    ) -> CheckoutResult<String> {
        let package = find_credit_package(package_id).ok_or_else(|| {
            warn!(user_id = %user.user_id, package_id, "checkout: unknown package");
            CheckoutError::UnknownPackage
        })?;

        let email = user.email.as_deref().ok_or_else(|| {
            warn!(user_id = %user.user_id, "checkout: missing email on session");
            CheckoutError::MissingEmail
        })?;

        info!(
            user_id = %user.user_id,
            package_id,
            credits = package.credits,
            "checkout: creating credit checkout session"
        );

        let link = self
            .stripe_client
            .create_credit_checkout_session(package, user.user_id, email)
            .await
            .map_err(|err| {
                error!(
                    user_id = %user.user_id,
                    package_id,
                    error = ?err,
                    "checkout: stripe session creation failed"
                );
                CheckoutError::Internal(err)
            })?;

        let now = Utc::now();
        self.transaction_repo
            .insert(InsertTransactionEntity {
                user_id: user.user_id,
                stripe_checkout_session_id: link.id.clone(),
                amount_cents: i32::try_from(package.amount_cents).unwrap_or(i32::MAX),
                credits_purchased: package.credits,
                status: TransactionStatus::Pending.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|err| {
                error!(
                    user_id = %user.user_id,
                    session_id = %link.id,
                    db_error = ?err,
                    "checkout: failed to record pending transaction"
                );
                CheckoutError::Internal(err)
            })?;

        info!(user_id = %user.user_id, session_id = %link.id, "checkout: session created");
        Ok(link.url)
    }
}

/// Email→session bridge for cross-device magic-link sign-in. Every operation
/// is best-effort: a broken bridge degrades the flow, it never fails it.
pub struct PendingCheckoutUseCase<PC>
where
    PC: PendingCheckoutRepository + Send + Sync + 'static,
{
    pending_checkout_repo: Arc<PC>,
}

impl<PC> PendingCheckoutUseCase<PC>
where
    PC: PendingCheckoutRepository + Send + Sync + 'static,
{
    pub fn new(pending_checkout_repo: Arc<PC>) -> Self {
        Self {
            pending_checkout_repo,
        }
    }

    pub async fn store(&self, email: &str, session_id: &str) {
        let now = Utc::now();
        let entity = PendingCheckoutEntity {
            email: email.to_lowercase(),
            stripe_session_id: session_id.to_string(),
            expires_at: now + Duration::hours(PENDING_CHECKOUT_TTL_HOURS),
            created_at: now,
        };

        if let Err(err) = self.pending_checkout_repo.upsert(entity).await {
            warn!(email, session_id, error = ?err, "pending checkout: store failed");
        }
    }

    pub async fn lookup(&self, email: &str) -> Option<String> {
        let entry = match self
            .pending_checkout_repo
            .find_by_email(&email.to_lowercase())
            .await
        {
            Ok(entry) => entry?,
            Err(err) => {
                warn!(email, error = ?err, "pending checkout: lookup failed");
                return None;
            }
        };

        if entry.expires_at <= Utc::now() {
            info!(email, "pending checkout: entry expired");
            self.clear(email).await;
            return None;
        }

        Some(entry.stripe_session_id)
    }

    pub async fn clear(&self, email: &str) {
        if let Err(err) = self
            .pending_checkout_repo
            .delete_by_email(&email.to_lowercase())
            .await
        {
            warn!(email, error = ?err, "pending checkout: delete failed");
        }
    }
}
