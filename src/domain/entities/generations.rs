use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::generations;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = generations)]
pub struct GenerationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub type_: String,
    pub status: String,
    pub original_image_url: Option<String>,
    pub prompt: Option<String>,
    pub settings: Option<Value>,
    pub credits_used: i32,
    pub replicate_prediction_id: Option<String>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generations)]
pub struct InsertGenerationEntity {
    pub user_id: Uuid,
    pub type_: String,
    pub status: String,
    pub original_image_url: Option<String>,
    pub prompt: Option<String>,
    pub settings: Option<Value>,
    pub credits_used: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = generations)]
pub struct UpdateGenerationEntity {
    pub status: Option<String>,
    pub replicate_prediction_id: Option<String>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}
