//! Per-user session lock trait.

use crate::error::Result;
use crate::state::UserId;
use std::future::Future;

/// Distributed mutual exclusion keyed by user id.
///
/// Guards the read-prune-generate-write window of token issuance so two
/// concurrent logins/refreshes for one user cannot leave the cache and the
/// durable store disagreeing about the current marker pair.
pub trait SessionLock: Send + Sync {
    /// Run `critical` while holding the user's lock.
    ///
    /// Acquisition blocks up to a bounded timeout; the lock is released
    /// unconditionally afterwards, whether `critical` succeeded or failed.
    ///
    /// # Errors
    ///
    /// - `AuthError::Internal` when the lock cannot be acquired in time.
    /// - Whatever `critical` returns.
    fn with_lock<T, Fut>(
        &self,
        user_id: UserId,
        critical: Fut,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        Fut: Future<Output = Result<T>> + Send;
}
