use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::profiles::{InsertProfileEntity, ProfileEntity};
use crate::domain::repositories::profiles::ProfileRepository;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::profiles};

pub struct ProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProfileRepository for ProfilePostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::id.eq(user_id))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::email.eq(email))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, insert_profile_entity: InsertProfileEntity) -> Result<ProfileEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(profiles::table)
            .values(&insert_profile_entity)
            .returning(ProfileEntity::as_returning())
            .get_result::<ProfileEntity>(&mut conn)?;

        Ok(result)
    }

    async fn deduct_credits(&self, user_id: Uuid, amount: i32) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The balance guard lives in the WHERE clause so the decrement is a
        // single atomic statement; zero rows means insufficient credits.
        let updated_rows = update(
            profiles::table
                .filter(profiles::id.eq(user_id))
                .filter(profiles::credits.ge(amount)),
        )
        .set((
            profiles::credits.eq(profiles::credits - amount),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(updated_rows > 0)
    }

    async fn add_credits(&self, user_id: Uuid, amount: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(profiles::table.filter(profiles::id.eq(user_id)))
            .set((
                profiles::credits.eq(profiles::credits + amount),
                profiles::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn set_stripe_customer_id(&self, user_id: Uuid, customer_id: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(profiles::table.filter(profiles::id.eq(user_id)))
            .set((
                profiles::stripe_customer_id.eq(customer_id),
                profiles::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
