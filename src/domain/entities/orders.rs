use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::orders;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = orders)]
pub struct OrderEntity {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct InsertOrderEntity {
    pub user_id: Option<Uuid>,
    pub tier: String,
    pub status: String,
    pub quiz_data: Option<Value>,
    pub interview_data: Option<Value>,
    pub stripe_checkout_session_id: Option<String>,
    pub view_token: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub amount_paid: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = orders)]
pub struct UpdateOrderEntity {
    pub user_id: Option<Uuid>,
    pub tier: Option<String>,
    pub status: Option<String>,
    pub quiz_data: Option<Value>,
    pub interview_data: Option<Value>,
    pub final_video_url: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub amount_paid: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}
