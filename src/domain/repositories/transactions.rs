use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::transactions::{InsertTransactionEntity, TransactionEntity};
use crate::domain::value_objects::enums::transaction_statuses::TransactionStatus;

#[async_trait]
#[automock]
pub trait TransactionRepository {
    async fn insert(&self, insert_transaction_entity: InsertTransactionEntity) -> Result<Uuid>;

    async fn find_by_checkout_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<TransactionEntity>>;

    async fn update_status_by_checkout_session_id(
        &self,
        session_id: &str,
        status: TransactionStatus,
    ) -> Result<()>;
}
