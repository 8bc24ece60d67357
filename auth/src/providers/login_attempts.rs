//! Login-attempt counter trait.

use crate::error::Result;
use crate::state::UserId;
use std::future::Future;

/// Per-user login-attempt counter with a TTL-bound window.
///
/// The count only grows within the window; it resets to absent on a
/// successful login or a password reset.
pub trait LoginAttempts: Send + Sync {
    /// Increment the counter and refresh its window, returning the new
    /// count. Increment-plus-expire is one atomic server-side operation.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn increment(&self, user_id: UserId) -> impl Future<Output = Result<i64>> + Send;

    /// Remove the counter.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn clear(&self, user_id: UserId) -> impl Future<Output = Result<()>> + Send;
}
