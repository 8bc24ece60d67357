//! Durable user store trait.

use crate::error::Result;
use crate::state::{User, UserId};
use std::future::Future;

/// Durable user records (PostgreSQL).
///
/// Users are soft-deleted/blocked via timestamps, never physically removed.
pub trait UserStore: Send + Sync {
    /// Create a user with the given base64-encoded password hash.
    ///
    /// # Errors
    ///
    /// - `AuthError::Conflict` when the email is already registered (unique
    ///   constraint violation, surfaced distinctly).
    /// - `AuthError::Internal` on any other store failure.
    fn create_user(
        &self,
        email: &str,
        password: &str,
        now: i64,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn user_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn user_by_id(&self, user_id: UserId) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Replace the password hash of an active (not deleted, not blocked)
    /// user and stamp `reset_password_at`.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn update_password(
        &self,
        user_id: UserId,
        password: &str,
        now: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Set the user's `blocked_at` marker.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn block_user(&self, user_id: UserId, now: i64) -> impl Future<Output = Result<()>> + Send;
}
