use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::newsletter_signups;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = newsletter_signups)]
pub struct NewsletterSignupEntity {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = newsletter_signups)]
pub struct InsertNewsletterSignupEntity {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
