//! Session cache trait: read-through mirrors of user and session rows.

use crate::error::Result;
use crate::state::{CacheLookup, SessionId, SessionRecord, User, UserId};
use std::future::Future;

/// Cache mirror for user and session rows (Redis).
///
/// Entries are TTL-bound JSON snapshots. `put_*` with `None` writes the
/// negative-cache marker (empty string with TTL), which lookups report as
/// [`CacheLookup::NegativeHit`], distinct from an absent key.
pub trait SessionCache: Send + Sync {
    /// Look up the cached user row.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn user_entry(&self, user_id: UserId)
    -> impl Future<Output = Result<CacheLookup<User>>> + Send;

    /// Cache a user row lookup result (`None` = negative marker).
    ///
    /// # Errors
    ///
    /// Returns error on cache failure; read-through callers treat this as
    /// best-effort and log instead of propagating.
    fn put_user_entry(
        &self,
        user_id: UserId,
        user: Option<&User>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Drop the cached user row.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn invalidate_user(&self, user_id: UserId) -> impl Future<Output = Result<()>> + Send;

    /// Look up the cached session row.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn session_entry(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<CacheLookup<SessionRecord>>> + Send;

    /// Cache a session row lookup result (`None` = negative marker).
    ///
    /// # Errors
    ///
    /// Returns error on cache failure; read-through callers treat this as
    /// best-effort and log instead of propagating.
    fn put_session_entry(
        &self,
        user_id: UserId,
        session_id: SessionId,
        record: Option<&SessionRecord>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Drop one cached session row.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn invalidate_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Drop several cached session rows.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn invalidate_sessions(
        &self,
        user_id: UserId,
        session_ids: &[SessionId],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Update `last_online`/`last_ip`/`last_location` on a live cached
    /// session without extending its TTL.
    ///
    /// Returns `false` when no live entry exists; the caller must not
    /// recreate one.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn touch_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
        last_online: i64,
        ip: &str,
        location: &str,
    ) -> impl Future<Output = Result<bool>> + Send;
}
