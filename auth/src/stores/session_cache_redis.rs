//! Redis session cache implementation.
//!
//! Mirrors user and session rows as TTL-bound JSON strings:
//!
//! - `user:data:{user_id}` → user row
//! - `user:session:{user_id}:{session_id}` → session row
//!
//! An empty string is the negative-cache marker: "the durable store has no
//! such row", distinct from an absent key. The mirror is authoritative for
//! the is-this-session-alive check, so invalidation (rotation, logout,
//! block) deletes keys rather than rewriting them.

use crate::constants;
use crate::error::{AuthError, Result};
use crate::providers::SessionCache;
use crate::state::{CacheLookup, SessionId, SessionRecord, User, UserId};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis-backed session cache.
#[derive(Clone)]
pub struct RedisSessionCache {
    conn_manager: ConnectionManager,
}

impl RedisSessionCache {
    /// Create a cache over an existing connection manager.
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }

    fn user_key(user_id: UserId) -> String {
        format!("user:data:{user_id}")
    }

    fn session_key(user_id: UserId, session_id: SessionId) -> String {
        format!("user:session:{user_id}:{session_id}")
    }

    async fn read_entry<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<CacheLookup<T>> {
        let mut conn = self.conn_manager.clone();

        let raw: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| AuthError::internal(format!("Failed to read cache key {key}: {e}")))?;

        match raw {
            None => Ok(CacheLookup::Miss),
            Some(raw) if raw.is_empty() => Ok(CacheLookup::NegativeHit),
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|e| {
                    AuthError::internal(format!("Corrupt cache entry at {key}: {e}"))
                })?;
                Ok(CacheLookup::Hit(value))
            }
        }
    }

    async fn write_entry<T: serde::Serialize>(
        &self,
        key: &str,
        value: Option<&T>,
        ttl_seconds: u64,
    ) -> Result<()> {
        let payload = match value {
            Some(value) => serde_json::to_string(value)
                .map_err(|e| AuthError::internal(format!("Failed to encode cache entry: {e}")))?,
            None => String::new(),
        };

        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .set_ex(key, payload, ttl_seconds)
            .await
            .map_err(|e| AuthError::internal(format!("Failed to write cache key {key}: {e}")))?;

        Ok(())
    }

    async fn delete_keys(&self, keys: Vec<String>) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .del(keys)
            .await
            .map_err(|e| AuthError::internal(format!("Failed to delete cache keys: {e}")))?;

        Ok(())
    }
}

impl SessionCache for RedisSessionCache {
    async fn user_entry(&self, user_id: UserId) -> Result<CacheLookup<User>> {
        self.read_entry(&Self::user_key(user_id)).await
    }

    async fn put_user_entry(&self, user_id: UserId, user: Option<&User>) -> Result<()> {
        self.write_entry(
            &Self::user_key(user_id),
            user,
            constants::USER_CACHE_TTL_SECS,
        )
        .await
    }

    async fn invalidate_user(&self, user_id: UserId) -> Result<()> {
        self.delete_keys(vec![Self::user_key(user_id)]).await
    }

    async fn session_entry(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<CacheLookup<SessionRecord>> {
        self.read_entry(&Self::session_key(user_id, session_id))
            .await
    }

    async fn put_session_entry(
        &self,
        user_id: UserId,
        session_id: SessionId,
        record: Option<&SessionRecord>,
    ) -> Result<()> {
        self.write_entry(
            &Self::session_key(user_id, session_id),
            record,
            constants::SESSION_CACHE_TTL_SECS,
        )
        .await
    }

    async fn invalidate_session(&self, user_id: UserId, session_id: SessionId) -> Result<()> {
        self.delete_keys(vec![Self::session_key(user_id, session_id)])
            .await
    }

    async fn invalidate_sessions(
        &self,
        user_id: UserId,
        session_ids: &[SessionId],
    ) -> Result<()> {
        let keys = session_ids
            .iter()
            .map(|session_id| Self::session_key(user_id, *session_id))
            .collect();

        self.delete_keys(keys).await
    }

    async fn touch_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
        last_online: i64,
        ip: &str,
        location: &str,
    ) -> Result<bool> {
        let key = Self::session_key(user_id, session_id);

        let mut record = match self.read_entry::<SessionRecord>(&key).await? {
            CacheLookup::Hit(record) => record,
            CacheLookup::Miss | CacheLookup::NegativeHit => return Ok(false),
        };

        record.last_online = last_online;
        record.last_ip = ip.to_string();
        record.last_location = location.to_string();

        let payload = serde_json::to_string(&record)
            .map_err(|e| AuthError::internal(format!("Failed to encode cache entry: {e}")))?;

        // XX + KEEPTTL: only rewrite a still-live entry, keeping its expiry.
        // The read-rewrite window on these display-only fields is accepted.
        let mut conn = self.conn_manager.clone();
        let written: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(payload)
            .arg("XX")
            .arg("KEEPTTL")
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::internal(format!("Failed to touch cache key {key}: {e}")))?;

        Ok(written.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionMarkers;

    // These tests require a running Redis instance:
    // docker run -d -p 6379:6379 redis:7-alpine

    fn sample_record(user_id: UserId, session_id: SessionId) -> SessionRecord {
        SessionRecord::new(
            user_id,
            session_id,
            SessionMarkers::new(),
            1_700_000_000,
            "203.0.113.9".to_string(),
            "Kuala Lumpur,MY".to_string(),
            "Firefox on Linux".to_string(),
        )
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_negative_marker_distinct_from_miss() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let cache = RedisSessionCache::new(conn);
        let user_id = UserId(910_001);

        assert_eq!(cache.user_entry(user_id).await.unwrap(), CacheLookup::Miss);

        cache.put_user_entry(user_id, None).await.unwrap();
        assert_eq!(
            cache.user_entry(user_id).await.unwrap(),
            CacheLookup::NegativeHit
        );

        cache.invalidate_user(user_id).await.unwrap();
        assert_eq!(cache.user_entry(user_id).await.unwrap(), CacheLookup::Miss);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_touch_never_recreates() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let cache = RedisSessionCache::new(conn);
        let user_id = UserId(910_002);
        let session_id = SessionId::new();

        // Absent entry: touch must report false and write nothing.
        let touched = cache
            .touch_session(user_id, session_id, 1, "198.51.100.7", "-,-")
            .await
            .unwrap();
        assert!(!touched);
        assert_eq!(
            cache.session_entry(user_id, session_id).await.unwrap(),
            CacheLookup::Miss
        );

        let record = sample_record(user_id, session_id);
        cache
            .put_session_entry(user_id, session_id, Some(&record))
            .await
            .unwrap();

        let touched = cache
            .touch_session(user_id, session_id, 1_700_000_500, "198.51.100.7", "Singapore,SG")
            .await
            .unwrap();
        assert!(touched);

        match cache.session_entry(user_id, session_id).await.unwrap() {
            CacheLookup::Hit(updated) => {
                assert_eq!(updated.last_online, 1_700_000_500);
                assert_eq!(updated.last_location, "Singapore,SG");
            }
            other => panic!("expected hit, got {other:?}"),
        }

        cache.invalidate_session(user_id, session_id).await.unwrap();
    }
}
