use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::pending_checkouts::PendingCheckoutEntity;

#[async_trait]
#[automock]
pub trait PendingCheckoutRepository {
    /// Insert-or-replace keyed by email; a later checkout overwrites an
    /// earlier one for the same address.
    async fn upsert(&self, entity: PendingCheckoutEntity) -> Result<()>;

    async fn find_by_email(&self, email: &str) -> Result<Option<PendingCheckoutEntity>>;

    async fn delete_by_email(&self, email: &str) -> Result<()>;
}
