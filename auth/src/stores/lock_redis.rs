//! Redis session lock implementation.
//!
//! `user:session_lock:{user_id}` holds a random token set with `NX PX`.
//! Release compares the token before deleting so an expired lock taken over
//! by another worker is never released by the first one. Acquisition polls
//! with a bounded blocking timeout distinct from the overall request
//! deadline.

use crate::constants;
use crate::error::{AuthError, Result};
use crate::providers::SessionLock;
use crate::state::UserId;
use redis::Script;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::{Duration, Instant};
use uuid::Uuid;

const RELEASE_LOCK: &str = r"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    end

    return 0
";

/// Interval between acquisition attempts.
const ACQUIRE_POLL: Duration = Duration::from_millis(100);

/// Redis-backed per-user session lock.
#[derive(Clone)]
pub struct RedisSessionLock {
    conn_manager: ConnectionManager,
    ttl: Duration,
    blocking_timeout: Duration,
}

impl RedisSessionLock {
    /// Create a lock with the default TTL and blocking timeout.
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self {
            conn_manager,
            ttl: Duration::from_secs(constants::SESSION_LOCK_TTL_SECS),
            blocking_timeout: Duration::from_secs(constants::SESSION_LOCK_TTL_SECS),
        }
    }

    fn lock_key(user_id: UserId) -> String {
        format!("user:session_lock:{user_id}")
    }

    async fn acquire(&self, key: &str) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + self.blocking_timeout;
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);

        loop {
            let mut conn = self.conn_manager.clone();
            let acquired: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
                .map_err(|e| AuthError::internal(format!("Lock acquisition failed: {e}")))?;

            if acquired.is_some() {
                tracing::debug!(key = %key, "Acquired session lock");
                return Ok(token);
            }

            if Instant::now() + ACQUIRE_POLL > deadline {
                return Err(AuthError::internal(format!(
                    "Timed out acquiring session lock {key}"
                )));
            }

            tokio::time::sleep(ACQUIRE_POLL).await;
        }
    }

    async fn release(&self, key: &str, token: &str) {
        let mut conn = self.conn_manager.clone();
        let released: std::result::Result<i64, redis::RedisError> = Script::new(RELEASE_LOCK)
            .key(key)
            .arg(token)
            .invoke_async(&mut conn)
            .await;

        match released {
            Ok(1) => tracing::debug!(key = %key, "Released session lock"),
            Ok(_) => tracing::warn!(key = %key, "Session lock expired before release"),
            Err(e) => tracing::error!(key = %key, error = %e, "Failed to release session lock"),
        }
    }
}

impl SessionLock for RedisSessionLock {
    async fn with_lock<T, Fut>(&self, user_id: UserId, critical: Fut) -> Result<T>
    where
        T: Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let key = Self::lock_key(user_id);
        let token = self.acquire(&key).await?;

        // Released on both arms; the TTL is only a crash backstop.
        let outcome = critical.await;
        self.release(&key, &token).await;

        outcome
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
    async fn test_lock_serializes_critical_sections() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let lock = RedisSessionLock::new(conn);
        let user_id = UserId(940_001);

        let counter = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));

        let c1 = std::sync::Arc::clone(&counter);
        let c2 = std::sync::Arc::clone(&counter);
        let lock2 = lock.clone();

        let (a, b) = tokio::join!(
            lock.with_lock(user_id, async move {
                let seen = c1.load(std::sync::atomic::Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                c1.store(seen + 1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }),
            lock2.with_lock(user_id, async move {
                let seen = c2.load(std::sync::atomic::Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                c2.store(seen + 1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }),
        );

        a.unwrap();
        b.unwrap();

        // Without mutual exclusion the read-sleep-write pattern loses one
        // increment.
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_lock_released_after_error() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let lock = RedisSessionLock::new(conn);
        let user_id = UserId(940_002);

        let failed: Result<()> = lock
            .with_lock(user_id, async { Err(AuthError::internal("boom")) })
            .await;
        assert!(failed.is_err());

        // The failed section must not leave the lock held.
        lock.with_lock(user_id, async { Ok(()) }).await.unwrap();
    }
}
