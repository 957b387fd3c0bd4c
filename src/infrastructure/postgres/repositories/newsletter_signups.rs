use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::newsletter_signups::InsertNewsletterSignupEntity;
use crate::domain::repositories::newsletter_signups::NewsletterSignupRepository;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::newsletter_signups,
};

pub struct NewsletterSignupPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl NewsletterSignupPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NewsletterSignupRepository for NewsletterSignupPostgres {
    async fn upsert(&self, email: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let entity = InsertNewsletterSignupEntity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
        };

        insert_into(newsletter_signups::table)
            .values(&entity)
            .on_conflict(newsletter_signups::email)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(())
    }
}
