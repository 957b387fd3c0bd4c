use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::generations::{
    GenerationEntity, InsertGenerationEntity, UpdateGenerationEntity,
};
use crate::domain::repositories::generations::GenerationRepository;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::generations};

pub struct GenerationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GenerationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GenerationRepository for GenerationPostgres {
    async fn insert(
        &self,
        insert_generation_entity: InsertGenerationEntity,
    ) -> Result<GenerationEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(generations::table)
            .values(&insert_generation_entity)
            .returning(GenerationEntity::as_returning())
            .get_result::<GenerationEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_id(&self, generation_id: Uuid) -> Result<Option<GenerationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = generations::table
            .filter(generations::id.eq(generation_id))
            .select(GenerationEntity::as_select())
            .first::<GenerationEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_prediction_id(
        &self,
        prediction_id: &str,
    ) -> Result<Option<GenerationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = generations::table
            .filter(generations::replicate_prediction_id.eq(prediction_id))
            .select(GenerationEntity::as_select())
            .first::<GenerationEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update(
        &self,
        generation_id: Uuid,
        update_generation_entity: UpdateGenerationEntity,
    ) -> Result<GenerationEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(generations::table.filter(generations::id.eq(generation_id)))
            .set(&update_generation_entity)
            .returning(GenerationEntity::as_returning())
            .get_result::<GenerationEntity>(&mut conn)?;

        Ok(result)
    }

    async fn delete(&self, generation_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(generations::table.filter(generations::id.eq(generation_id)))
            .execute(&mut conn)?;

        Ok(())
    }
}
