//! Error types for session and credential operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Domain error taxonomy.
///
/// Every variant carries a stable numeric code surfaced to clients inside a
/// `200`-wrapped envelope; only [`AuthError::Internal`] maps to transport 500.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Bad credentials, expired or mismatched session, blocked/deleted user.
    #[error("{0}")]
    Unauthorized(String),

    /// A presented signature was valid but past its expiry. Distinguished
    /// from the generic invalid-token case so clients can trigger a refresh.
    #[error("The token has expired")]
    TokenExpired,

    /// Duplicate identity.
    #[error("{0}")]
    Conflict(String),

    /// Login throttling, OTP cooldown, or per-IP rate limit.
    #[error("{0}")]
    TooManyRequests(String),

    /// Unknown identity, e.g. on a reset-password request.
    #[error("{0}")]
    NotFound(String),

    /// Input that parses but cannot be processed.
    #[error("{0}")]
    UnprocessableEntity(String),

    /// Unexpected failure: store errors, exhausted retries, lock timeouts.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable application-level code embedded in the response envelope.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) | Self::TokenExpired => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::UnprocessableEntity(_) => 422,
            Self::TooManyRequests(_) => 429,
            Self::Internal(_) => 500,
        }
    }

    /// Short status text matching the numeric code.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) | Self::TokenExpired => "Unauthorized",
            Self::NotFound(_) => "Not Found",
            Self::Conflict(_) => "Conflict",
            Self::UnprocessableEntity(_) => "Unprocessable Entity",
            Self::TooManyRequests(_) => "Too Many Requests",
            Self::Internal(_) => "Internal Server Error",
        }
    }

    /// Structured data attached to the envelope.
    ///
    /// Expired tokens carry `{"is_expired": true}` so clients can refresh
    /// instead of re-authenticating.
    #[must_use]
    pub fn data(&self) -> serde_json::Value {
        match self {
            Self::TokenExpired => serde_json::json!({ "is_expired": true }),
            _ => serde_json::json!({}),
        }
    }

    /// Returns `true` when the error should map to transport status 500.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Build an [`AuthError::Unauthorized`].
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Build an [`AuthError::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        Self::Internal(format!("Redis error: {err}"))
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("Database error: {err}"))
    }
}
