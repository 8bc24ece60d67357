//! Mock provider implementations for testing.
//!
//! Simple in-memory implementations of every provider trait so the
//! orchestrator's flow logic runs in unit and integration tests without
//! Redis or PostgreSQL.

pub mod email;
pub mod geo;
pub mod lock;
pub mod login_attempts;
pub mod otp_store;
pub mod reset_store;
pub mod session_cache;
pub mod session_store;
pub mod user_store;

pub use email::MockEmailSender;
pub use geo::MockGeoLocator;
pub use lock::MockSessionLock;
pub use login_attempts::MockLoginAttempts;
pub use otp_store::MockOtpStore;
pub use reset_store::MockResetStore;
pub use session_cache::MockSessionCache;
pub use session_store::MockSessionStore;
pub use user_store::MockUserStore;

use crate::error::{AuthError, Result};
use std::sync::{Mutex, MutexGuard};

/// Lock a mock's state map, mapping poisoning to a domain error.
pub(crate) fn lock_state<T>(state: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    state
        .lock()
        .map_err(|_| AuthError::internal("Mutex lock failed"))
}
