use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::support_tickets::InsertSupportTicketEntity;
use crate::domain::repositories::support_tickets::SupportTicketRepository;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::support_tickets,
};

pub struct SupportTicketPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SupportTicketPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SupportTicketRepository for SupportTicketPostgres {
    async fn insert(
        &self,
        insert_support_ticket_entity: InsertSupportTicketEntity,
    ) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let ticket_id = insert_into(support_tickets::table)
            .values(&insert_support_ticket_entity)
            .returning(support_tickets::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(ticket_id)
    }
}
