//! Reset-password session store trait.

use crate::error::Result;
use crate::state::{ResetSession, UserId};
use std::future::Future;

/// Single reset-password session per user, TTL-bound and single-use.
pub trait ResetStore: Send + Sync {
    /// Store the reset session, returning its expiry timestamp.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn save(
        &self,
        user_id: UserId,
        session: ResetSession,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Read the reset session without consuming it (cooldown checks).
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn peek(&self, user_id: UserId) -> impl Future<Output = Result<Option<ResetSession>>> + Send;

    /// Atomically read and delete the reset session, enforcing single use:
    /// of two racing redemptions, exactly one observes the entry.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn take(&self, user_id: UserId) -> impl Future<Output = Result<Option<ResetSession>>> + Send;
}
