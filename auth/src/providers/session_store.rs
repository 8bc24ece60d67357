//! Durable session store trait.

use crate::error::Result;
use crate::state::{SessionId, SessionMarkers, SessionRecord, UserId};
use std::future::Future;

/// Durable session records (PostgreSQL).
pub trait SessionStore: Send + Sync {
    /// Insert a session row.
    ///
    /// Returns `false` on a `(user_id, session_id)` collision so callers can
    /// retry with a fresh id; any other failure is an error.
    ///
    /// # Errors
    ///
    /// Returns error on store failure other than a key collision.
    fn create_session(&self, record: &SessionRecord) -> impl Future<Output = Result<bool>> + Send;

    /// Fetch a session row, soft-deleted or not.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn session_by_id(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>>> + Send;

    /// Replace both markers and stamp `refreshed_at`.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn rotate_markers(
        &self,
        user_id: UserId,
        session_id: SessionId,
        markers: SessionMarkers,
        now: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Soft-delete one session.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn soft_delete(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Soft-delete every live, non-expired session beyond the newest `keep`
    /// (ordered by `refreshed_at` descending), returning the deleted ids so
    /// the caller can drop their cache mirrors.
    ///
    /// Sessions whose `refreshed_at` is at or before `expire_threshold` are
    /// already invalid and are left untouched.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn prune_sessions(
        &self,
        user_id: UserId,
        keep: i64,
        expire_threshold: i64,
        now: i64,
    ) -> impl Future<Output = Result<Vec<SessionId>>> + Send;

    /// Soft-delete every live session of a user, returning the deleted ids.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn soft_delete_all(
        &self,
        user_id: UserId,
        now: i64,
    ) -> impl Future<Output = Result<Vec<SessionId>>> + Send;

    /// Update the last-seen IP/location/online columns.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    fn update_last_seen(
        &self,
        user_id: UserId,
        session_id: SessionId,
        ip: &str,
        location: &str,
        last_online: i64,
    ) -> impl Future<Output = Result<()>> + Send;
}
