//! Core domain types.
//!
//! All types are plain data: the cache mirrors serialize them as JSON and
//! the durable stores map them with `sqlx::FromRow`. Timestamps are epoch
//! seconds; `0` means "not set" for the soft-delete/block markers.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Unique identifier for a user (database `BIGSERIAL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random `SessionId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque rotation marker pair embedded in tokens and mirrored in storage.
///
/// Both ids change on every refresh; a presented token whose embedded id no
/// longer matches the stored one is stale or replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarkers {
    /// Current access-token marker.
    pub access_id: Uuid,

    /// Current refresh-token marker.
    pub refresh_id: Uuid,
}

impl SessionMarkers {
    /// Generate a fresh, unguessable marker pair.
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_id: Uuid::new_v4(),
            refresh_id: Uuid::new_v4(),
        }
    }
}

impl Default for SessionMarkers {
    fn default() -> Self {
        Self::new()
    }
}

/// User row (durable source of truth).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// User id.
    pub id: i64,

    /// Email address (unique identity).
    pub email: String,

    /// Base64-encoded `salt ‖ derived key` password hash.
    pub password: String,

    /// When the password was last reset (0 = never).
    pub reset_password_at: i64,

    /// Account creation timestamp.
    pub created_at: i64,

    /// Soft-delete timestamp (0 = active).
    pub deleted_at: i64,

    /// Block timestamp (0 = not blocked).
    pub blocked_at: i64,

    /// Role discriminator.
    pub role: i16,
}

impl User {
    /// `true` when the user is neither soft-deleted nor blocked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at == 0 && self.blocked_at == 0
    }

    /// Typed user id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId(self.id)
    }
}

/// Public view of a user attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User id.
    pub user_id: UserId,

    /// Email address.
    pub email: String,

    /// Role discriminator.
    pub role: i16,

    /// Account creation timestamp.
    pub created_at: i64,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Session row (durable source of truth, mirrored into the cache as JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Owning user id.
    pub user_id: i64,

    /// Session id (composite key with `user_id`).
    pub session_id: Uuid,

    /// Current access-token marker.
    pub access_id: Uuid,

    /// Current refresh-token marker.
    pub refresh_id: Uuid,

    /// Session creation timestamp.
    pub created_at: i64,

    /// Soft-delete timestamp (0 = live).
    pub deleted_at: i64,

    /// Last marker rotation timestamp.
    pub refreshed_at: i64,

    /// Last heartbeat timestamp.
    pub last_online: i64,

    /// Last seen client IP.
    pub last_ip: String,

    /// Last seen "city,country" label.
    pub last_location: String,

    /// Client-supplied device label.
    pub device_name: String,
}

impl SessionRecord {
    /// Build a fresh record for a newly issued session.
    #[must_use]
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        markers: SessionMarkers,
        now: i64,
        last_ip: String,
        last_location: String,
        device_name: String,
    ) -> Self {
        Self {
            user_id: user_id.0,
            session_id: session_id.0,
            access_id: markers.access_id,
            refresh_id: markers.refresh_id,
            created_at: now,
            deleted_at: 0,
            refreshed_at: now,
            last_online: now,
            last_ip,
            last_location,
            device_name,
        }
    }
}

/// Minimal session view consumed by the JWT guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionData {
    /// Session id.
    pub session_id: SessionId,

    /// Stored access marker.
    pub access_id: Uuid,

    /// Stored refresh marker.
    pub refresh_id: Uuid,
}

/// Signed token pair returned by login/register/refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived ES256 access token.
    pub access_token: String,

    /// Long-lived ES256 refresh token.
    pub refresh_token: String,

    /// Access token expiry (epoch seconds).
    pub access_expires_at: i64,
}

/// Purpose of an OTP, part of its cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OtpKind {
    /// Prove control of an email before registration.
    Register,
}

impl OtpKind {
    /// Numeric key segment used in the cache.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Register => 0,
        }
    }
}

/// Reset-password session cached per user, consumed on a single use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSession {
    /// Id embedded in the signed reset token; must match on redemption.
    pub session_id: SessionId,

    /// When the link was issued, for cooldown enforcement.
    pub issued_at: i64,
}

/// Outcome of a cache lookup that distinguishes "no entry" from a cached
/// negative result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// No cache entry; fall back to the durable store.
    Miss,

    /// Negative-cache marker: the durable store is known to have no row.
    NegativeHit,

    /// Cached value.
    Hit(T),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_generation() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_markers_rotate_to_distinct_values() {
        let a = SessionMarkers::new();
        let b = SessionMarkers::new();
        assert_ne!(a.access_id, b.access_id);
        assert_ne!(a.refresh_id, b.refresh_id);
    }

    #[test]
    fn test_user_activity_flags() {
        let mut user = User {
            id: 1,
            email: "trader@example.com".to_string(),
            password: String::new(),
            reset_password_at: 0,
            created_at: 1,
            deleted_at: 0,
            blocked_at: 0,
            role: 0,
        };
        assert!(user.is_active());

        user.blocked_at = 100;
        assert!(!user.is_active());

        user.blocked_at = 0;
        user.deleted_at = 100;
        assert!(!user.is_active());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_session_record_round_trips_as_json() {
        let record = SessionRecord::new(
            UserId(7),
            SessionId::new(),
            SessionMarkers::new(),
            1_700_000_000,
            "203.0.113.9".to_string(),
            "Kuala Lumpur,MY".to_string(),
            "Firefox on Linux".to_string(),
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
