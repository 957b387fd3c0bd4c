use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::transactions::{InsertTransactionEntity, TransactionEntity};
use crate::domain::repositories::transactions::TransactionRepository;
use crate::domain::value_objects::enums::transaction_statuses::TransactionStatus;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::transactions};

pub struct TransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TransactionRepository for TransactionPostgres {
    async fn insert(&self, insert_transaction_entity: InsertTransactionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transaction_id = insert_into(transactions::table)
            .values(&insert_transaction_entity)
            .returning(transactions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(transaction_id)
    }

    async fn find_by_checkout_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<TransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = transactions::table
            .filter(transactions::stripe_checkout_session_id.eq(session_id))
            .select(TransactionEntity::as_select())
            .first::<TransactionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_status_by_checkout_session_id(
        &self,
        session_id: &str,
        status: TransactionStatus,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            transactions::table
                .filter(transactions::stripe_checkout_session_id.eq(session_id)),
        )
        .set((
            transactions::status.eq(status.to_string()),
            transactions::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }
}
