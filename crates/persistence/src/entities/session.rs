//! Portal session entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use domain::models::SessionData;

/// Database row mapping for the portal_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionEntity {
    /// SHA-256 of the cookie token.
    pub id: String,
    pub data: Json<SessionData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
