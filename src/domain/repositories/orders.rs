use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::orders::{InsertOrderEntity, OrderEntity, UpdateOrderEntity};

#[async_trait]
#[automock]
pub trait OrderRepository {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderEntity>>;

    async fn find_by_checkout_session_id(&self, session_id: &str)
        -> Result<Option<OrderEntity>>;

    async fn insert(&self, insert_order_entity: InsertOrderEntity) -> Result<OrderEntity>;

    /// Insert keyed on `stripe_checkout_session_id`; a concurrent insert for
    /// the same session resolves to the already-existing row.
    async fn upsert_by_checkout_session(
        &self,
        insert_order_entity: InsertOrderEntity,
    ) -> Result<OrderEntity>;

    async fn set_owner(&self, order_id: Uuid, user_id: Uuid) -> Result<()>;

    async fn update(
        &self,
        order_id: Uuid,
        update_order_entity: UpdateOrderEntity,
    ) -> Result<OrderEntity>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<OrderEntity>>;

    /// Stamps `first_viewed_at` only when it is still null, so the first view
    /// is recorded exactly once.
    async fn record_first_view(&self, order_id: Uuid, viewed_at: DateTime<Utc>) -> Result<()>;
}
