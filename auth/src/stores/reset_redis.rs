//! Redis reset-password session store implementation.
//!
//! One JSON entry per user, `user:reset:{user_id}`, TTL-bound to the reset
//! token lifetime. Redemption consumes the entry with an atomic get-delete,
//! so a reset token can only ever be honored once.

use crate::constants;
use crate::error::{AuthError, Result};
use crate::providers::ResetStore;
use crate::state::{ResetSession, UserId};
use crate::stores::script;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Redis-backed reset-password session store.
#[derive(Clone)]
pub struct RedisResetStore {
    conn_manager: ConnectionManager,
}

impl RedisResetStore {
    /// Create a store over an existing connection manager.
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }

    fn reset_key(user_id: UserId) -> String {
        format!("user:reset:{user_id}")
    }

    fn decode(raw: &str) -> Result<ResetSession> {
        serde_json::from_str(raw)
            .map_err(|e| AuthError::internal(format!("Corrupt reset session entry: {e}")))
    }
}

impl ResetStore for RedisResetStore {
    async fn save(&self, user_id: UserId, session: ResetSession) -> Result<i64> {
        let key = Self::reset_key(user_id);
        let payload = serde_json::to_string(&session)
            .map_err(|e| AuthError::internal(format!("Failed to encode reset session: {e}")))?;

        let mut conn = self.conn_manager.clone();
        #[allow(clippy::cast_sign_loss)]
        let ttl = constants::RESET_PASSWORD_LIFETIME_SECS as u64;
        let _: () = conn
            .set_ex(&key, payload, ttl)
            .await
            .map_err(|e| AuthError::internal(format!("Failed to store reset session: {e}")))?;

        tracing::info!(user_id = %user_id, "Stored reset-password session");
        Ok(session.issued_at + constants::RESET_PASSWORD_LIFETIME_SECS)
    }

    async fn peek(&self, user_id: UserId) -> Result<Option<ResetSession>> {
        let mut conn = self.conn_manager.clone();
        let raw: Option<String> = conn
            .get(Self::reset_key(user_id))
            .await
            .map_err(|e| AuthError::internal(format!("Failed to read reset session: {e}")))?;

        raw.as_deref().map(Self::decode).transpose()
    }

    async fn take(&self, user_id: UserId) -> Result<Option<ResetSession>> {
        let mut conn = self.conn_manager.clone();
        let raw = script::get_del(&mut conn, &Self::reset_key(user_id)).await?;

        raw.as_deref().map(Self::decode).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionId;

    // Requires a running Redis instance:
    // docker run -d -p 6379:6379 redis:7-alpine

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_take_consumes_entry() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let store = RedisResetStore::new(conn);
        let user_id = UserId(930_001);

        let session = ResetSession {
            session_id: SessionId::new(),
            issued_at: chrono::Utc::now().timestamp(),
        };
        store.save(user_id, session).await.unwrap();

        assert_eq!(store.peek(user_id).await.unwrap(), Some(session));
        assert_eq!(store.take(user_id).await.unwrap(), Some(session));

        // Consumed: both peek and a second take observe nothing.
        assert_eq!(store.peek(user_id).await.unwrap(), None);
        assert_eq!(store.take(user_id).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_concurrent_takes_yield_one_winner() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let store = RedisResetStore::new(conn);
        let user_id = UserId(930_002);

        let session = ResetSession {
            session_id: SessionId::new(),
            issued_at: chrono::Utc::now().timestamp(),
        };
        store.save(user_id, session).await.unwrap();

        let store2 = store.clone();
        let (a, b) = tokio::join!(store.take(user_id), store2.take(user_id));

        let winners = usize::from(a.unwrap().is_some()) + usize::from(b.unwrap().is_some());
        assert_eq!(winners, 1, "exactly one take may observe the entry");
    }
}
