use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::support_tickets::InsertSupportTicketEntity;

#[async_trait]
#[automock]
pub trait SupportTicketRepository {
    async fn insert(
        &self,
        insert_support_ticket_entity: InsertSupportTicketEntity,
    ) -> Result<Uuid>;
}
