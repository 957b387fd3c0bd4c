use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*};
use std::sync::Arc;

use crate::domain::entities::pending_checkouts::PendingCheckoutEntity;
use crate::domain::repositories::pending_checkouts::PendingCheckoutRepository;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::pending_checkouts,
};

pub struct PendingCheckoutPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PendingCheckoutPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PendingCheckoutRepository for PendingCheckoutPostgres {
    async fn upsert(&self, entity: PendingCheckoutEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let stripe_session_id = entity.stripe_session_id.clone();
        let expires_at = entity.expires_at;

        insert_into(pending_checkouts::table)
            .values(&entity)
            .on_conflict(pending_checkouts::email)
            .do_update()
            .set((
                pending_checkouts::stripe_session_id.eq(stripe_session_id),
                pending_checkouts::expires_at.eq(expires_at),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PendingCheckoutEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = pending_checkouts::table
            .filter(pending_checkouts::email.eq(email))
            .select(PendingCheckoutEntity::as_select())
            .first::<PendingCheckoutEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete_by_email(&self, email: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(pending_checkouts::table.filter(pending_checkouts::email.eq(email)))
            .execute(&mut conn)?;

        Ok(())
    }
}
