//! Redis login-attempt counter implementation.
//!
//! One integer key per user, `user:login_attempts:{user_id}`, incremented
//! and re-expired in a single script so the window refresh cannot be lost
//! between the two commands.

use crate::constants;
use crate::error::{AuthError, Result};
use crate::providers::LoginAttempts;
use crate::state::UserId;
use crate::stores::script;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Redis-backed login-attempt counter.
#[derive(Clone)]
pub struct RedisLoginAttempts {
    conn_manager: ConnectionManager,
}

impl RedisLoginAttempts {
    /// Create a counter store over an existing connection manager.
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }

    fn attempts_key(user_id: UserId) -> String {
        format!("user:login_attempts:{user_id}")
    }
}

impl LoginAttempts for RedisLoginAttempts {
    async fn increment(&self, user_id: UserId) -> Result<i64> {
        let mut conn = self.conn_manager.clone();
        let count = script::incr_with_expiry(
            &mut conn,
            &Self::attempts_key(user_id),
            1,
            constants::LOGIN_ATTEMPT_WINDOW_SECS,
        )
        .await?;

        tracing::debug!(user_id = %user_id, attempts = count, "Recorded login attempt");
        Ok(count)
    }

    async fn clear(&self, user_id: UserId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .del(Self::attempts_key(user_id))
            .await
            .map_err(|e| AuthError::internal(format!("Failed to clear login attempts: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Requires a running Redis instance:
    // docker run -d -p 6379:6379 redis:7-alpine

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_counter_grows_and_clears() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let attempts = RedisLoginAttempts::new(conn);
        let user_id = UserId(920_001);

        attempts.clear(user_id).await.unwrap();
        assert_eq!(attempts.increment(user_id).await.unwrap(), 1);
        assert_eq!(attempts.increment(user_id).await.unwrap(), 2);

        attempts.clear(user_id).await.unwrap();
        assert_eq!(attempts.increment(user_id).await.unwrap(), 1);

        attempts.clear(user_id).await.unwrap();
    }
}
