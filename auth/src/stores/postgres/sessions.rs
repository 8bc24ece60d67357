//! PostgreSQL session store implementation.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{SessionId, SessionMarkers, SessionRecord, UserId};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed session store.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for PostgresSessionStore {
    async fn create_session(&self, record: &SessionRecord) -> Result<bool> {
        let inserted = sqlx::query(
            r"
            INSERT INTO sessions
                (user_id, session_id, access_id, refresh_id, created_at,
                 deleted_at, refreshed_at, last_online, last_ip,
                 last_location, device_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(record.user_id)
        .bind(record.session_id)
        .bind(record.access_id)
        .bind(record.refresh_id)
        .bind(record.created_at)
        .bind(record.deleted_at)
        .bind(record.refreshed_at)
        .bind(record.last_online)
        .bind(&record.last_ip)
        .bind(&record.last_location)
        .bind(&record.device_name)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(
                    user_id = record.user_id,
                    session_id = %record.session_id,
                    "Session id collision"
                );
                Ok(false)
            }
            Err(e) => Err(AuthError::internal(format!(
                "Failed to create session: {e}"
            ))),
        }
    }

    async fn session_by_id(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(
            r"
            SELECT user_id, session_id, access_id, refresh_id, created_at,
                   deleted_at, refreshed_at, last_online, last_ip,
                   last_location, device_name
            FROM sessions
            WHERE user_id = $1 AND session_id = $2
            ",
        )
        .bind(user_id.0)
        .bind(session_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to get session: {e}")))
    }

    async fn rotate_markers(
        &self,
        user_id: UserId,
        session_id: SessionId,
        markers: SessionMarkers,
        now: i64,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE sessions
            SET access_id = $3, refresh_id = $4, refreshed_at = $5
            WHERE user_id = $1 AND session_id = $2
            ",
        )
        .bind(user_id.0)
        .bind(session_id.0)
        .bind(markers.access_id)
        .bind(markers.refresh_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to rotate session markers: {e}")))?;

        tracing::debug!(user_id = %user_id, session_id = %session_id, "Rotated session markers");
        Ok(())
    }

    async fn soft_delete(&self, user_id: UserId, session_id: SessionId, now: i64) -> Result<()> {
        sqlx::query(
            r"
            UPDATE sessions
            SET deleted_at = $3
            WHERE user_id = $1 AND session_id = $2
            ",
        )
        .bind(user_id.0)
        .bind(session_id.0)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to delete session: {e}")))?;

        Ok(())
    }

    async fn prune_sessions(
        &self,
        user_id: UserId,
        keep: i64,
        expire_threshold: i64,
        now: i64,
    ) -> Result<Vec<SessionId>> {
        // Keep the newest `keep` live sessions; already-expired rows are
        // invalid on their own and are left untouched.
        let deleted: Vec<Uuid> = sqlx::query_scalar(
            r"
            UPDATE sessions
            SET deleted_at = $4
            WHERE user_id = $1 AND session_id IN (
                SELECT session_id
                FROM sessions
                WHERE user_id = $1 AND deleted_at = 0 AND refreshed_at > $3
                ORDER BY refreshed_at DESC
                OFFSET $2
            )
            RETURNING session_id
            ",
        )
        .bind(user_id.0)
        .bind(keep)
        .bind(expire_threshold)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to prune sessions: {e}")))?;

        if !deleted.is_empty() {
            tracing::info!(
                user_id = %user_id,
                pruned = deleted.len(),
                "Pruned sessions beyond cap"
            );
        }

        Ok(deleted.into_iter().map(SessionId).collect())
    }

    async fn soft_delete_all(&self, user_id: UserId, now: i64) -> Result<Vec<SessionId>> {
        let deleted: Vec<Uuid> = sqlx::query_scalar(
            r"
            UPDATE sessions
            SET deleted_at = $2
            WHERE user_id = $1 AND deleted_at = 0
            RETURNING session_id
            ",
        )
        .bind(user_id.0)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to delete user sessions: {e}")))?;

        tracing::info!(
            user_id = %user_id,
            session_count = deleted.len(),
            "Soft-deleted all user sessions"
        );

        Ok(deleted.into_iter().map(SessionId).collect())
    }

    async fn update_last_seen(
        &self,
        user_id: UserId,
        session_id: SessionId,
        ip: &str,
        location: &str,
        last_online: i64,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE sessions
            SET last_ip = $3, last_location = $4, last_online = $5
            WHERE user_id = $1 AND session_id = $2
            ",
        )
        .bind(user_id.0)
        .bind(session_id.0)
        .bind(ip)
        .bind(location)
        .bind(last_online)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to update session info: {e}")))?;

        Ok(())
    }
}
