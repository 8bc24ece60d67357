//! PostgreSQL user store implementation.

use crate::error::{AuthError, Result};
use crate::providers::UserStore;
use crate::state::{User, UserId};
use sqlx::PgPool;

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PostgresUserStore {
    async fn create_user(&self, email: &str, password: &str, now: i64) -> Result<User> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (email, password, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, password, reset_password_at, created_at,
                      deleted_at, blocked_at, role
            ",
        )
        .bind(email)
        .bind(password)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::Conflict("Email already exists.".to_string());
                }
            }
            AuthError::internal(format!("Failed to create user: {e}"))
        })
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r"
            SELECT id, email, password, reset_password_at, created_at,
                   deleted_at, blocked_at, role
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to get user by email: {e}")))
    }

    async fn user_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r"
            SELECT id, email, password, reset_password_at, created_at,
                   deleted_at, blocked_at, role
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to get user by id: {e}")))
    }

    async fn update_password(&self, user_id: UserId, password: &str, now: i64) -> Result<()> {
        sqlx::query(
            r"
            UPDATE users
            SET password = $2, reset_password_at = $3
            WHERE id = $1 AND deleted_at = 0 AND blocked_at = 0
            ",
        )
        .bind(user_id.0)
        .bind(password)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to update password: {e}")))?;

        tracing::info!(user_id = %user_id, "Updated user password");
        Ok(())
    }

    async fn block_user(&self, user_id: UserId, now: i64) -> Result<()> {
        sqlx::query("UPDATE users SET blocked_at = $2 WHERE id = $1")
            .bind(user_id.0)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::internal(format!("Failed to block user: {e}")))?;

        tracing::info!(user_id = %user_id, "Blocked user");
        Ok(())
    }
}
