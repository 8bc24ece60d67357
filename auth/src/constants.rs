//! Engine-wide constants.
//!
//! Durations are expressed in seconds; timestamps throughout the engine are
//! epoch seconds (`i64`), matching the durable schema.

/// Access token lifetime: 1 hour.
pub const ACCESS_TOKEN_LIFETIME_SECS: i64 = 60 * 60;

/// Refresh token lifetime: 90 days. A session whose `refreshed_at` is older
/// than this is invalid regardless of cache state.
pub const REFRESH_TOKEN_LIFETIME_SECS: i64 = 90 * 24 * 60 * 60;

/// Maximum concurrent sessions per user; the oldest by `refreshed_at` is
/// pruned when exceeded.
pub const MAX_SESSIONS_PER_USER: i64 = 5;

/// Maximum login attempts per user within [`LOGIN_ATTEMPT_WINDOW_SECS`].
pub const MAX_LOGIN_ATTEMPTS: i64 = 20;

/// Login-attempt counter window: 1 hour.
pub const LOGIN_ATTEMPT_WINDOW_SECS: i64 = 60 * 60;

/// Attempts to find a non-colliding session id before giving up.
pub const SESSION_CREATE_RETRIES: u32 = 3;

/// OTP validity window: 10 minutes.
pub const OTP_LIFETIME_SECS: i64 = 10 * 60;

/// Minimum gap between OTP sends for the same `(kind, identifier)`.
pub const OTP_SEND_COOLDOWN_SECS: i64 = 60;

/// Verify attempts allowed per OTP before it is permanently dead.
pub const OTP_MAX_RETRIES: i64 = 5;

/// Number of decimal digits in an OTP code.
pub const OTP_CODE_DIGITS: u32 = 4;

/// Reset-password token and cache-entry lifetime: 10 minutes.
pub const RESET_PASSWORD_LIFETIME_SECS: i64 = 10 * 60;

/// Minimum gap between reset-password link sends for the same user.
pub const RESET_PASSWORD_SEND_COOLDOWN_SECS: i64 = 60;

/// Session lock TTL. The lock only guards the read-prune-generate-write
/// window, so it stays short.
pub const SESSION_LOCK_TTL_SECS: u64 = 3;

/// Read-through cache TTL for user rows.
pub const USER_CACHE_TTL_SECS: u64 = 60 * 60;

/// Read-through cache TTL for session rows.
pub const SESSION_CACHE_TTL_SECS: u64 = 60 * 60;

/// Salt length in bytes for password hashes.
pub const PASSWORD_SALT_LEN: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetimes_are_ordered() {
        assert!(ACCESS_TOKEN_LIFETIME_SECS < REFRESH_TOKEN_LIFETIME_SECS);
        assert!(OTP_SEND_COOLDOWN_SECS < OTP_LIFETIME_SECS);
        assert!(RESET_PASSWORD_SEND_COOLDOWN_SECS < RESET_PASSWORD_LIFETIME_SECS);
    }
}
