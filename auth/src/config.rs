//! Engine configuration.
//!
//! Values default to the constants in [`crate::constants`]; applications
//! override them with the builder-style `with_*` methods.

use crate::constants;

/// Auth engine configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token lifetime in seconds.
    pub access_token_lifetime: i64,

    /// Refresh token lifetime in seconds. Doubles as the session lifetime:
    /// a session not refreshed within this window is invalid.
    pub refresh_token_lifetime: i64,

    /// Maximum concurrent sessions per user.
    pub max_sessions_per_user: i64,

    /// Maximum login attempts per user per window.
    pub max_login_attempts: i64,

    /// Maximum OTP sends per source IP per window.
    pub max_otp_per_ip: i64,

    /// OTP per-IP rate-limit window in seconds.
    pub otp_ip_window: i64,

    /// Base URL of the reset-password page; the signed token and expiry are
    /// appended as query parameters.
    pub reset_password_link: String,
}

impl AuthConfig {
    /// Create a configuration with the given reset-password link base.
    #[must_use]
    pub const fn new(reset_password_link: String) -> Self {
        Self {
            access_token_lifetime: constants::ACCESS_TOKEN_LIFETIME_SECS,
            refresh_token_lifetime: constants::REFRESH_TOKEN_LIFETIME_SECS,
            max_sessions_per_user: constants::MAX_SESSIONS_PER_USER,
            max_login_attempts: constants::MAX_LOGIN_ATTEMPTS,
            max_otp_per_ip: 10,
            otp_ip_window: constants::OTP_LIFETIME_SECS,
            reset_password_link,
        }
    }

    /// Set the access token lifetime in seconds.
    #[must_use]
    pub const fn with_access_token_lifetime(mut self, seconds: i64) -> Self {
        self.access_token_lifetime = seconds;
        self
    }

    /// Set the refresh token (and session) lifetime in seconds.
    #[must_use]
    pub const fn with_refresh_token_lifetime(mut self, seconds: i64) -> Self {
        self.refresh_token_lifetime = seconds;
        self
    }

    /// Set the per-user session cap.
    #[must_use]
    pub const fn with_max_sessions_per_user(mut self, max: i64) -> Self {
        self.max_sessions_per_user = max;
        self
    }

    /// Set the per-user login attempt cap.
    #[must_use]
    pub const fn with_max_login_attempts(mut self, max: i64) -> Self {
        self.max_login_attempts = max;
        self
    }

    /// Set the per-IP OTP send cap and window.
    #[must_use]
    pub const fn with_otp_ip_limit(mut self, max: i64, window_seconds: i64) -> Self {
        self.max_otp_per_ip = max;
        self.otp_ip_window = window_seconds;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = AuthConfig::new("https://app.tradelog.dev/reset".to_string())
            .with_max_sessions_per_user(3)
            .with_max_login_attempts(10)
            .with_otp_ip_limit(5, 300);

        assert_eq!(config.max_sessions_per_user, 3);
        assert_eq!(config.max_login_attempts, 10);
        assert_eq!(config.max_otp_per_ip, 5);
        assert_eq!(config.otp_ip_window, 300);
        assert_eq!(config.reset_password_link, "https://app.tradelog.dev/reset");
    }

    #[test]
    fn test_defaults_follow_constants() {
        let config = AuthConfig::default();
        assert_eq!(config.access_token_lifetime, 3600);
        assert_eq!(config.refresh_token_lifetime, 90 * 24 * 3600);
        assert_eq!(config.max_sessions_per_user, 5);
        assert_eq!(config.max_login_attempts, 20);
    }
}
