//! Mock login-attempt counter for testing.

use crate::error::Result;
use crate::mocks::lock_state;
use crate::providers::LoginAttempts;
use crate::state::UserId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock login-attempt counter backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MockLoginAttempts {
    state: Arc<Mutex<HashMap<i64, i64>>>,
}

impl MockLoginAttempts {
    /// Create an empty counter store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a user (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn count(&self, user_id: UserId) -> Result<i64> {
        Ok(lock_state(&self.state)?.get(&user_id.0).copied().unwrap_or(0))
    }

    /// Preload a count, e.g. to simulate an exhausted window.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn set_count(&self, user_id: UserId, count: i64) -> Result<()> {
        lock_state(&self.state)?.insert(user_id.0, count);
        Ok(())
    }
}

impl LoginAttempts for MockLoginAttempts {
    fn increment(&self, user_id: UserId) -> impl Future<Output = Result<i64>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock_state(&state)?;
            let count = guard.entry(user_id.0).or_insert(0);
            *count += 1;
            Ok(*count)
        }
    }

    fn clear(&self, user_id: UserId) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            lock_state(&state)?.remove(&user_id.0);
            Ok(())
        }
    }
}
