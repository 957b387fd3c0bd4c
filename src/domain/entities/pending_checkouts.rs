use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::pending_checkouts;

/// Bridges a magic-link sign-in back to the checkout session that triggered
/// it. Keyed by email because the post-auth redirect loses query params.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = pending_checkouts)]
pub struct PendingCheckoutEntity {
    pub email: String,
    pub stripe_session_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
