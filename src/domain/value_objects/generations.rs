use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::generations::GenerationEntity;

/// Request body shared by the enhance and generate endpoints. The route
/// decides the generation type; the body carries the creative inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub image_url: Option<String>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub original_image_url: Option<String>,
    pub prompt: Option<String>,
    pub settings: Option<Value>,
    pub credits_used: i32,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<GenerationEntity> for GenerationDto {
    fn from(entity: GenerationEntity) -> Self {
        Self {
            id: entity.id,
            type_: entity.type_,
            status: entity.status,
            original_image_url: entity.original_image_url,
            prompt: entity.prompt,
            settings: entity.settings,
            credits_used: entity.credits_used,
            result_url: entity.result_url,
            error_message: entity.error_message,
            completed_at: entity.completed_at,
            created_at: entity.created_at,
        }
    }
}
