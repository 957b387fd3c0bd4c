use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[async_trait]
#[automock]
pub trait NewsletterSignupRepository {
    /// Idempotent: an address that already signed up is left untouched.
    async fn upsert(&self, email: &str) -> Result<()>;
}
