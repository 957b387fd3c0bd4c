use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::orders::{InsertOrderEntity, OrderEntity, UpdateOrderEntity};
use crate::domain::repositories::orders::OrderRepository;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::orders};

pub struct OrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrderRepository for OrderPostgres {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = orders::table
            .filter(orders::id.eq(order_id))
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_checkout_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = orders::table
            .filter(orders::stripe_checkout_session_id.eq(session_id))
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, insert_order_entity: InsertOrderEntity) -> Result<OrderEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(orders::table)
            .values(&insert_order_entity)
            .returning(OrderEntity::as_returning())
            .get_result::<OrderEntity>(&mut conn)?;

        Ok(result)
    }

    async fn upsert_by_checkout_session(
        &self,
        insert_order_entity: InsertOrderEntity,
    ) -> Result<OrderEntity> {
        let session_id = insert_order_entity
            .stripe_checkout_session_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("checkout session id is required for order upsert"))?;

        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The unique index on stripe_checkout_session_id makes this safe to
        // race: the losing insert is a no-op and both callers read the same
        // row back.
        insert_into(orders::table)
            .values(&insert_order_entity)
            .on_conflict(orders::stripe_checkout_session_id)
            .do_nothing()
            .execute(&mut conn)?;

        let result = orders::table
            .filter(orders::stripe_checkout_session_id.eq(session_id))
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)?;

        Ok(result)
    }

    async fn set_owner(&self, order_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(orders::table.filter(orders::id.eq(order_id)))
            .set((
                orders::user_id.eq(user_id),
                orders::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update(
        &self,
        order_id: Uuid,
        update_order_entity: UpdateOrderEntity,
    ) -> Result<OrderEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(orders::table.filter(orders::id.eq(order_id)))
            .set(&update_order_entity)
            .returning(OrderEntity::as_returning())
            .get_result::<OrderEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = orders::table
            .order(orders::created_at.desc())
            .limit(limit)
            .select(OrderEntity::as_select())
            .load::<OrderEntity>(&mut conn)?;

        Ok(results)
    }

    async fn record_first_view(&self, order_id: Uuid, viewed_at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Guarded update: only the first viewer ever writes the timestamp.
        update(
            orders::table
                .filter(orders::id.eq(order_id))
                .filter(orders::first_viewed_at.is_null()),
        )
        .set(orders::first_viewed_at.eq(viewed_at))
        .execute(&mut conn)?;

        Ok(())
    }
}
