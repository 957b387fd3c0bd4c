use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::orders::OrderEntity;

pub const INTERVIEW_DATA_VERSION: u32 = 1;
pub const QUIZ_DATA_VERSION: u32 = 1;

fn interview_version() -> u32 {
    INTERVIEW_DATA_VERSION
}

fn quiz_version() -> u32 {
    QUIZ_DATA_VERSION
}

/// Quiz answers captured at purchase time. Versioned so the shape can evolve
/// without silently drifting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizData {
    #[serde(default = "quiz_version")]
    pub version: u32,
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,
}

impl Default for QuizData {
    fn default() -> Self {
        Self {
            version: QUIZ_DATA_VERSION,
            answers: BTreeMap::new(),
        }
    }
}

/// Interview material accumulated across autosaves and the final intake
/// submission. Merging is field-wise: only provided fields overwrite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewData {
    #[serde(default = "interview_version")]
    pub version: u32,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i32>,
    #[serde(default)]
    pub reference_photo_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_note_url: Option<String>,
}

impl Default for InterviewData {
    fn default() -> Self {
        Self {
            version: INTERVIEW_DATA_VERSION,
            answers: BTreeMap::new(),
            step: None,
            reference_photo_urls: Vec::new(),
            audio_note_url: None,
        }
    }
}

/// Partial interview payload accepted from autosave and intake requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterviewPatch {
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub step: Option<i32>,
}

impl InterviewData {
    /// Reads stored interview JSON, tolerating rows written before the
    /// versioned shape existed.
    pub fn from_stored(value: Option<&Value>) -> Self {
        value
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn merge(&mut self, patch: InterviewPatch) {
        self.answers.extend(patch.answers);
        if patch.step.is_some() {
            self.step = patch.step;
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl QuizData {
    pub fn from_stored(value: Option<&Value>) -> Self {
        value
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn merge(&mut self, other: QuizData) {
        self.answers.extend(other.answers);
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimOrderRequest {
    pub order_id: Option<Uuid>,
    pub session_id: Option<String>,
}

/// Capability secret embedded in the shareable gift link. Compared by exact
/// match, never derivable from the order id.
pub fn generate_view_token() -> String {
    use rand::{Rng, distributions::Alphanumeric};

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminCreateOrderRequest {
    pub tier: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub amount_paid: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateOrderRequest {
    pub status: Option<String>,
    pub tier: Option<String>,
    pub final_video_url: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
}

/// Owner-facing order projection returned by claim/intake/admin endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDto {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub tier: String,
    pub status: String,
    pub quiz_data: Option<Value>,
    pub interview_data: Option<Value>,
    pub stripe_checkout_session_id: Option<String>,
    pub final_video_url: Option<String>,
    pub view_token: String,
    pub first_viewed_at: Option<DateTime<Utc>>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub amount_paid: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderEntity> for OrderDto {
    fn from(entity: OrderEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            tier: entity.tier,
            status: entity.status,
            quiz_data: entity.quiz_data,
            interview_data: entity.interview_data,
            stripe_checkout_session_id: entity.stripe_checkout_session_id,
            final_video_url: entity.final_video_url,
            view_token: entity.view_token,
            first_viewed_at: entity.first_viewed_at,
            recipient_name: entity.recipient_name,
            recipient_email: entity.recipient_email,
            amount_paid: entity.amount_paid,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// What an unauthenticated gift viewer is allowed to see. The view token
/// itself is never echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct GiftViewDto {
    pub id: Uuid,
    pub tier: String,
    pub status: String,
    pub final_video_url: Option<String>,
    pub recipient_name: Option<String>,
    pub first_viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderEntity> for GiftViewDto {
    fn from(entity: OrderEntity) -> Self {
        Self {
            id: entity.id,
            tier: entity.tier,
            status: entity.status,
            final_video_url: entity.final_video_url,
            recipient_name: entity.recipient_name,
            first_viewed_at: entity.first_viewed_at,
            created_at: entity.created_at,
        }
    }
}
