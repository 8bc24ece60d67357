//! Mock session cache for testing.

use crate::error::Result;
use crate::mocks::lock_state;
use crate::providers::SessionCache;
use crate::state::{CacheLookup, SessionId, SessionRecord, User, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    // None = negative-cache marker.
    users: HashMap<i64, Option<User>>,
    sessions: HashMap<(i64, Uuid), Option<SessionRecord>>,
}

/// Mock session cache backed by in-memory maps.
#[derive(Debug, Clone, Default)]
pub struct MockSessionCache {
    state: Arc<Mutex<State>>,
}

impl MockSessionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any entry (including a negative marker) exists for the
    /// session (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn has_session_entry(&self, user_id: UserId, session_id: SessionId) -> Result<bool> {
        let guard = lock_state(&self.state)?;
        Ok(guard.sessions.contains_key(&(user_id.0, session_id.0)))
    }
}

impl SessionCache for MockSessionCache {
    fn user_entry(&self, user_id: UserId) -> impl Future<Output = Result<CacheLookup<User>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock_state(&state)?;
            Ok(match guard.users.get(&user_id.0) {
                None => CacheLookup::Miss,
                Some(None) => CacheLookup::NegativeHit,
                Some(Some(user)) => CacheLookup::Hit(user.clone()),
            })
        }
    }

    fn put_user_entry(
        &self,
        user_id: UserId,
        user: Option<&User>,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let user = user.cloned();

        async move {
            lock_state(&state)?.users.insert(user_id.0, user);
            Ok(())
        }
    }

    fn invalidate_user(&self, user_id: UserId) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            lock_state(&state)?.users.remove(&user_id.0);
            Ok(())
        }
    }

    fn session_entry(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<CacheLookup<SessionRecord>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock_state(&state)?;
            Ok(match guard.sessions.get(&(user_id.0, session_id.0)) {
                None => CacheLookup::Miss,
                Some(None) => CacheLookup::NegativeHit,
                Some(Some(record)) => CacheLookup::Hit(record.clone()),
            })
        }
    }

    fn put_session_entry(
        &self,
        user_id: UserId,
        session_id: SessionId,
        record: Option<&SessionRecord>,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let record = record.cloned();

        async move {
            lock_state(&state)?
                .sessions
                .insert((user_id.0, session_id.0), record);
            Ok(())
        }
    }

    fn invalidate_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            lock_state(&state)?.sessions.remove(&(user_id.0, session_id.0));
            Ok(())
        }
    }

    fn invalidate_sessions(
        &self,
        user_id: UserId,
        session_ids: &[SessionId],
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let session_ids = session_ids.to_vec();

        async move {
            let mut guard = lock_state(&state)?;
            for session_id in session_ids {
                guard.sessions.remove(&(user_id.0, session_id.0));
            }
            Ok(())
        }
    }

    fn touch_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
        last_online: i64,
        ip: &str,
        location: &str,
    ) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);
        let ip = ip.to_string();
        let location = location.to_string();

        async move {
            let mut guard = lock_state(&state)?;

            match guard.sessions.get_mut(&(user_id.0, session_id.0)) {
                Some(Some(record)) => {
                    record.last_online = last_online;
                    record.last_ip = ip;
                    record.last_location = location;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }
}
