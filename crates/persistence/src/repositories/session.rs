//! Session repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::SessionData;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::entities::SessionEntity;
use crate::metrics::QueryTimer;

/// Repository for server-side session rows.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new SessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads a session that has not expired.
    pub async fn find_active(&self, id: &str) -> Result<Option<SessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_session");
        let result = sqlx::query_as::<_, SessionEntity>(
            r#"
            SELECT id, data, created_at, updated_at, expires_at
            FROM portal_sessions
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Inserts or replaces a session payload and moves its expiry.
    pub async fn save(
        &self,
        id: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("save_session");
        let result = sqlx::query(
            r#"
            INSERT INTO portal_sessions (id, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET data = EXCLUDED.data,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            "#,
        )
        .bind(id)
        .bind(Json(data))
        .bind(expires_at)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Deletes a session.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_session");
        let result = sqlx::query("DELETE FROM portal_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }

    /// Deletes every expired session and returns the removed payloads.
    pub async fn delete_expired(&self) -> Result<Vec<SessionData>, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_sessions");
        let result = sqlx::query_scalar::<_, Json<SessionData>>(
            "DELETE FROM portal_sessions WHERE expires_at <= NOW() RETURNING data",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|rows| rows.into_iter().map(|Json(data)| data).collect())
    }
}
