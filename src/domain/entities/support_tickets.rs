use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::support_tickets;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = support_tickets)]
pub struct SupportTicketEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub order_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = support_tickets)]
pub struct InsertSupportTicketEntity {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub order_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
