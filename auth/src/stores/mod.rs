//! Production store implementations.
//!
//! Redis backs the ephemeral state (session mirrors, OTP sessions, counters,
//! reset sessions, locks); PostgreSQL backs the durable records. Every
//! conditional cache mutation goes through the script module so it executes
//! atomically server-side.

pub mod lock_redis;
pub mod login_attempts_redis;
pub mod otp_redis;
pub mod postgres;
pub mod reset_redis;
pub mod script;
pub mod session_cache_redis;

pub use lock_redis::RedisSessionLock;
pub use login_attempts_redis::RedisLoginAttempts;
pub use otp_redis::RedisOtpStore;
pub use postgres::{PostgresSessionStore, PostgresUserStore};
pub use reset_redis::RedisResetStore;
pub use session_cache_redis::RedisSessionCache;

use crate::error::{AuthError, Result};
use redis::Client;
use redis::aio::ConnectionManager;

/// Open a Redis connection manager for the store constructors.
///
/// # Errors
///
/// Returns error when the URL is invalid or the connection cannot be
/// established.
pub async fn connect_redis(redis_url: &str) -> Result<ConnectionManager> {
    let client = Client::open(redis_url)
        .map_err(|e| AuthError::internal(format!("Failed to create Redis client: {e}")))?;

    ConnectionManager::new(client)
        .await
        .map_err(|e| AuthError::internal(format!("Failed to create Redis connection manager: {e}")))
}
