//! Mock user store for testing.

use crate::error::{AuthError, Result};
use crate::mocks::lock_state;
use crate::providers::UserStore;
use crate::state::{User, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct State {
    users: HashMap<i64, User>,
    next_id: i64,
}

/// Mock user store backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MockUserStore {
    state: Arc<Mutex<State>>,
}

impl MockUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn user_count(&self) -> Result<usize> {
        Ok(lock_state(&self.state)?.users.len())
    }

    /// Fetch a stored user by id (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn stored_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(lock_state(&self.state)?.users.get(&user_id.0).cloned())
    }
}

impl UserStore for MockUserStore {
    fn create_user(
        &self,
        email: &str,
        password: &str,
        now: i64,
    ) -> impl Future<Output = Result<User>> + Send {
        let state = Arc::clone(&self.state);
        let email = email.to_string();
        let password = password.to_string();

        async move {
            let mut guard = lock_state(&state)?;

            if guard.users.values().any(|user| user.email == email) {
                return Err(AuthError::Conflict("Email already exists.".to_string()));
            }

            guard.next_id += 1;
            let user = User {
                id: guard.next_id,
                email,
                password,
                reset_password_at: 0,
                created_at: now,
                deleted_at: 0,
                blocked_at: 0,
                role: 0,
            };

            guard.users.insert(user.id, user.clone());
            Ok(user)
        }
    }

    fn user_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send {
        let state = Arc::clone(&self.state);
        let email = email.to_string();

        async move {
            let guard = lock_state(&state)?;
            Ok(guard.users.values().find(|user| user.email == email).cloned())
        }
    }

    fn user_by_id(&self, user_id: UserId) -> impl Future<Output = Result<Option<User>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock_state(&state)?;
            Ok(guard.users.get(&user_id.0).cloned())
        }
    }

    fn update_password(
        &self,
        user_id: UserId,
        password: &str,
        now: i64,
    ) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let password = password.to_string();

        async move {
            let mut guard = lock_state(&state)?;

            if let Some(user) = guard.users.get_mut(&user_id.0) {
                if user.deleted_at == 0 && user.blocked_at == 0 {
                    user.password = password;
                    user.reset_password_at = now;
                }
            }

            Ok(())
        }
    }

    fn block_user(&self, user_id: UserId, now: i64) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock_state(&state)?;

            if let Some(user) = guard.users.get_mut(&user_id.0) {
                user.blocked_at = now;
            }

            Ok(())
        }
    }
}
