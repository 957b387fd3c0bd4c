use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::profiles::{InsertProfileEntity, ProfileEntity};

#[async_trait]
#[automock]
pub trait ProfileRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<ProfileEntity>>;

    async fn insert(&self, insert_profile_entity: InsertProfileEntity) -> Result<ProfileEntity>;

    /// Conditional decrement. Returns `false` when the balance is short; the
    /// row is only touched when `credits >= amount`.
    async fn deduct_credits(&self, user_id: Uuid, amount: i32) -> Result<bool>;

    async fn add_credits(&self, user_id: Uuid, amount: i32) -> Result<()>;

    async fn set_stripe_customer_id(&self, user_id: Uuid, customer_id: &str) -> Result<()>;
}
