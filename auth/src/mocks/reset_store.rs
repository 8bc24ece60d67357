//! Mock reset-password session store for testing.

use crate::constants;
use crate::error::Result;
use crate::mocks::lock_state;
use crate::providers::ResetStore;
use crate::state::{ResetSession, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock reset-password session store backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MockResetStore {
    state: Arc<Mutex<HashMap<i64, ResetSession>>>,
}

impl MockResetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResetStore for MockResetStore {
    fn save(
        &self,
        user_id: UserId,
        session: ResetSession,
    ) -> impl Future<Output = Result<i64>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            lock_state(&state)?.insert(user_id.0, session);
            Ok(session.issued_at + constants::RESET_PASSWORD_LIFETIME_SECS)
        }
    }

    fn peek(&self, user_id: UserId) -> impl Future<Output = Result<Option<ResetSession>>> + Send {
        let state = Arc::clone(&self.state);

        async move { Ok(lock_state(&state)?.get(&user_id.0).copied()) }
    }

    fn take(&self, user_id: UserId) -> impl Future<Output = Result<Option<ResetSession>>> + Send {
        let state = Arc::clone(&self.state);

        async move { Ok(lock_state(&state)?.remove(&user_id.0)) }
    }
}
