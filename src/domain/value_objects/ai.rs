use serde::Deserialize;
use serde_json::Value;

use crate::domain::value_objects::enums::generation_types::GenerationType;

/// Job submission handed to the AI provider.
#[derive(Debug, Clone)]
pub struct AiJobRequest {
    pub task_type: GenerationType,
    pub image_url: Option<String>,
    pub prompt: Option<String>,
    pub settings: Option<Value>,
}

/// Point-in-time provider view of a job, used by the polling fallback.
/// `status` carries the provider's wire values (`completed`, `failed`,
/// anything else means still running).
#[derive(Debug, Clone)]
pub struct AiJobSnapshot {
    pub job_id: String,
    pub status: String,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

/// Inbound completion/failure callback from the AI provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AiWebhookPayload {
    pub job_id: String,
    pub status: String,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

pub const AI_STATUS_COMPLETED: &str = "completed";
pub const AI_STATUS_FAILED: &str = "failed";
