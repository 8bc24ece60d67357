//! Mock session lock for testing.
//!
//! Provides real mutual exclusion (one tokio mutex per user) so concurrency
//! tests exercise the same serialization the Redis lock provides.

use crate::error::Result;
use crate::mocks::lock_state;
use crate::providers::SessionLock;
use crate::state::UserId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock per-user lock backed by tokio mutexes.
#[derive(Debug, Clone, Default)]
pub struct MockSessionLock {
    locks: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>>,
}

impl MockSessionLock {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, user_id: UserId) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut guard = lock_state(&self.locks)?;
        Ok(Arc::clone(
            guard
                .entry(user_id.0)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        ))
    }
}

impl SessionLock for MockSessionLock {
    fn with_lock<T, Fut>(
        &self,
        user_id: UserId,
        critical: Fut,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let lock = self.lock_for(user_id);

        async move {
            let lock = lock?;
            let _guard = lock.lock().await;
            critical.await
        }
    }
}
