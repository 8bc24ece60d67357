//! Redis OTP store implementation.
//!
//! OTP state lives in one hash per `(kind, identifier)`:
//! `user:otp:{kind}:{identifier}` → `{issued_at, code, status, retry}`,
//! where `status` is `0` (unverified) or `1` (verified) and `code` is the
//! zero-salt digest of the numeric code. Save and verify each run as one
//! conditional script invocation, so concurrent requests cannot both pass
//! the cooldown or both consume a retry.

use crate::constants;
use crate::error::Result;
use crate::providers::OtpStore;
use crate::state::OtpKind;
use crate::stores::script::{self, Action, Condition, ConditionSet, Operator};
use redis::aio::ConnectionManager;
use std::net::IpAddr;

/// Redis-backed OTP store.
#[derive(Clone)]
pub struct RedisOtpStore {
    conn_manager: ConnectionManager,
}

impl RedisOtpStore {
    /// Create a store over an existing connection manager.
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }

    fn otp_key(kind: OtpKind, identifier: &str) -> String {
        format!("user:otp:{}:{identifier}", kind.as_u8())
    }

    fn ip_key(ip: IpAddr) -> String {
        format!("user:otp_ip:{ip}")
    }
}

impl OtpStore for RedisOtpStore {
    async fn save_otp(
        &self,
        kind: OtpKind,
        identifier: &str,
        code_hash: &str,
        now: i64,
    ) -> Result<Option<i64>> {
        let key = Self::otp_key(kind, identifier);

        // Write only when no send happened inside the cooldown; a missing
        // issued_at coerces to 0 and always passes.
        let sets = [ConditionSet {
            conditions: vec![Condition::new(
                "issued_at",
                Operator::Lt,
                now - constants::OTP_SEND_COOLDOWN_SECS,
            )],
            success_actions: vec![
                Action::hset("issued_at", now),
                Action::hset("code", code_hash),
                Action::hset("status", 0),
                Action::hset("retry", 0),
                Action::expire(constants::OTP_LIFETIME_SECS),
            ],
            failure_actions: vec![],
        }];

        let mut conn = self.conn_manager.clone();
        let reply = script::hset_with_condition(&mut conn, &key, &sets, &[]).await?;

        if reply.succeeded(0) {
            tracing::info!(key = %key, "Stored OTP session");
            Ok(Some(now + constants::OTP_LIFETIME_SECS))
        } else {
            tracing::warn!(key = %key, "OTP send rejected by cooldown");
            Ok(None)
        }
    }

    async fn verify_otp(
        &self,
        kind: OtpKind,
        identifier: &str,
        code_hash: &str,
        now: i64,
    ) -> Result<bool> {
        let key = Self::otp_key(kind, identifier);

        // First set probes existence; the second does the real check and
        // either flips status to verified or burns a retry.
        let sets = [
            ConditionSet {
                conditions: vec![Condition::new("issued_at", Operator::Ne, "")],
                success_actions: vec![],
                failure_actions: vec![],
            },
            ConditionSet {
                conditions: vec![
                    Condition::new(
                        "issued_at",
                        Operator::Gt,
                        now - constants::OTP_LIFETIME_SECS,
                    ),
                    Condition::new("status", Operator::Eq, 0),
                    Condition::new("retry", Operator::Lt, constants::OTP_MAX_RETRIES),
                    Condition::new("code", Operator::Eq, code_hash),
                ],
                success_actions: vec![Action::hset("status", 1)],
                failure_actions: vec![Action::hincr("retry", 1)],
            },
        ];

        let mut conn = self.conn_manager.clone();
        let reply = script::hset_with_condition(&mut conn, &key, &sets, &[]).await?;

        if !reply.succeeded(0) {
            tracing::debug!(key = %key, "OTP verify against absent session");
        }

        Ok(reply.succeeded(1))
    }

    async fn record_ip_send(&self, ip: IpAddr, window_seconds: i64) -> Result<i64> {
        let mut conn = self.conn_manager.clone();
        script::incr_with_expiry(&mut conn, &Self::ip_key(ip), 1, window_seconds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::OtpStore as _;

    // These tests require a running Redis instance:
    // docker run -d -p 6379:6379 redis:7-alpine

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_save_is_rejected_inside_cooldown() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let store = RedisOtpStore::new(conn);
        let identifier = format!("cooldown-{}@example.com", uuid::Uuid::new_v4());

        let first = store
            .save_otp(OtpKind::Register, &identifier, "digest-a", now())
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .save_otp(OtpKind::Register, &identifier, "digest-b", now())
            .await
            .unwrap();
        assert!(second.is_none(), "second send inside cooldown must fail");
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_verify_flips_status_exactly_once() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let store = RedisOtpStore::new(conn);
        let identifier = format!("verify-{}@example.com", uuid::Uuid::new_v4());

        store
            .save_otp(OtpKind::Register, &identifier, "digest", now())
            .await
            .unwrap();

        assert!(
            store
                .verify_otp(OtpKind::Register, &identifier, "digest", now())
                .await
                .unwrap()
        );

        // Already verified: the same code must not verify twice.
        assert!(
            !store
                .verify_otp(OtpKind::Register, &identifier, "digest", now())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_retry_budget_is_consumed() {
        let conn = crate::stores::connect_redis("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let store = RedisOtpStore::new(conn);
        let identifier = format!("retry-{}@example.com", uuid::Uuid::new_v4());

        store
            .save_otp(OtpKind::Register, &identifier, "digest", now())
            .await
            .unwrap();

        for _ in 0..constants::OTP_MAX_RETRIES {
            assert!(
                !store
                    .verify_otp(OtpKind::Register, &identifier, "wrong", now())
                    .await
                    .unwrap()
            );
        }

        // Budget exhausted: even the correct code fails now.
        assert!(
            !store
                .verify_otp(OtpKind::Register, &identifier, "digest", now())
                .await
                .unwrap()
        );
    }
}
