use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::generations::{
    GenerationEntity, InsertGenerationEntity, UpdateGenerationEntity,
};

#[async_trait]
#[automock]
pub trait GenerationRepository {
    async fn insert(
        &self,
        insert_generation_entity: InsertGenerationEntity,
    ) -> Result<GenerationEntity>;

    async fn find_by_id(&self, generation_id: Uuid) -> Result<Option<GenerationEntity>>;

    async fn find_by_prediction_id(&self, prediction_id: &str)
        -> Result<Option<GenerationEntity>>;

    async fn update(
        &self,
        generation_id: Uuid,
        update_generation_entity: UpdateGenerationEntity,
    ) -> Result<GenerationEntity>;

    async fn delete(&self, generation_id: Uuid) -> Result<()>;
}
