//! Mock session store for testing.

use crate::error::Result;
use crate::mocks::lock_state;
use crate::providers::SessionStore;
use crate::state::{SessionId, SessionMarkers, SessionRecord, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Mock session store backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    state: Arc<Mutex<HashMap<(i64, Uuid), SessionRecord>>>,
}

impl MockSessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (not soft-deleted) sessions of a user (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn live_sessions(&self, user_id: UserId) -> Result<Vec<SessionRecord>> {
        let guard = lock_state(&self.state)?;
        Ok(guard
            .values()
            .filter(|record| record.user_id == user_id.0 && record.deleted_at == 0)
            .cloned()
            .collect())
    }

    /// Fetch one stored record (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn stored_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Option<SessionRecord>> {
        let guard = lock_state(&self.state)?;
        Ok(guard.get(&(user_id.0, session_id.0)).cloned())
    }
}

impl SessionStore for MockSessionStore {
    fn create_session(&self, record: &SessionRecord) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);
        let record = record.clone();

        async move {
            let mut guard = lock_state(&state)?;
            let key = (record.user_id, record.session_id);

            if guard.contains_key(&key) {
                return Ok(false);
            }

            guard.insert(key, record);
            Ok(true)
        }
    }

    fn session_by_id(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock_state(&state)?;
            Ok(guard.get(&(user_id.0, session_id.0)).cloned())
        }
    }

    fn rotate_markers(
        &self,
        user_id: UserId,
        session_id: SessionId,
        markers: SessionMarkers,
        now: i64,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock_state(&state)?;

            if let Some(record) = guard.get_mut(&(user_id.0, session_id.0)) {
                record.access_id = markers.access_id;
                record.refresh_id = markers.refresh_id;
                record.refreshed_at = now;
            }

            Ok(())
        }
    }

    fn soft_delete(
        &self,
        user_id: UserId,
        session_id: SessionId,
        now: i64,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock_state(&state)?;

            if let Some(record) = guard.get_mut(&(user_id.0, session_id.0)) {
                record.deleted_at = now;
            }

            Ok(())
        }
    }

    fn prune_sessions(
        &self,
        user_id: UserId,
        keep: i64,
        expire_threshold: i64,
        now: i64,
    ) -> impl Future<Output = Result<Vec<SessionId>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock_state(&state)?;

            let mut live: Vec<(Uuid, i64)> = guard
                .values()
                .filter(|record| {
                    record.user_id == user_id.0
                        && record.deleted_at == 0
                        && record.refreshed_at > expire_threshold
                })
                .map(|record| (record.session_id, record.refreshed_at))
                .collect();

            // Newest first; everything past `keep` is pruned.
            live.sort_by(|a, b| b.1.cmp(&a.1));

            let mut pruned = Vec::new();
            for (session_id, _) in live.into_iter().skip(usize::try_from(keep).unwrap_or(0)) {
                if let Some(record) = guard.get_mut(&(user_id.0, session_id)) {
                    record.deleted_at = now;
                    pruned.push(SessionId(session_id));
                }
            }

            Ok(pruned)
        }
    }

    fn soft_delete_all(
        &self,
        user_id: UserId,
        now: i64,
    ) -> impl Future<Output = Result<Vec<SessionId>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock_state(&state)?;
            let mut deleted = Vec::new();

            for record in guard.values_mut() {
                if record.user_id == user_id.0 && record.deleted_at == 0 {
                    record.deleted_at = now;
                    deleted.push(SessionId(record.session_id));
                }
            }

            Ok(deleted)
        }
    }

    fn update_last_seen(
        &self,
        user_id: UserId,
        session_id: SessionId,
        ip: &str,
        location: &str,
        last_online: i64,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let ip = ip.to_string();
        let location = location.to_string();

        async move {
            let mut guard = lock_state(&state)?;

            if let Some(record) = guard.get_mut(&(user_id.0, session_id.0)) {
                record.last_ip = ip;
                record.last_location = location;
                record.last_online = last_online;
            }

            Ok(())
        }
    }
}
