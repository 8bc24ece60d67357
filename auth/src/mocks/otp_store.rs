//! Mock OTP store for testing.
//!
//! Mirrors the semantics of the atomic Redis scripts: cooldown-guarded
//! save, verify-or-burn-a-retry, per-IP send counter.

use crate::constants;
use crate::error::Result;
use crate::mocks::lock_state;
use crate::providers::OtpStore;
use crate::state::OtpKind;
use std::collections::HashMap;
use std::future::Future;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct OtpEntry {
    issued_at: i64,
    code_hash: String,
    verified: bool,
    retry: i64,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<(u8, String), OtpEntry>,
    ip_sends: HashMap<IpAddr, i64>,
}

/// Mock OTP store backed by in-memory maps.
#[derive(Debug, Clone, Default)]
pub struct MockOtpStore {
    state: Arc<Mutex<State>>,
}

impl MockOtpStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry count recorded for an identifier (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn retry_count(&self, kind: OtpKind, identifier: &str) -> Result<i64> {
        let guard = lock_state(&self.state)?;
        Ok(guard
            .entries
            .get(&(kind.as_u8(), identifier.to_string()))
            .map_or(0, |entry| entry.retry))
    }
}

impl OtpStore for MockOtpStore {
    fn save_otp(
        &self,
        kind: OtpKind,
        identifier: &str,
        code_hash: &str,
        now: i64,
    ) -> impl Future<Output = Result<Option<i64>>> + Send {
        let state = Arc::clone(&self.state);
        let key = (kind.as_u8(), identifier.to_string());
        let code_hash = code_hash.to_string();

        async move {
            let mut guard = lock_state(&state)?;

            if let Some(entry) = guard.entries.get(&key) {
                if entry.issued_at >= now - constants::OTP_SEND_COOLDOWN_SECS {
                    return Ok(None);
                }
            }

            guard.entries.insert(
                key,
                OtpEntry {
                    issued_at: now,
                    code_hash,
                    verified: false,
                    retry: 0,
                },
            );

            Ok(Some(now + constants::OTP_LIFETIME_SECS))
        }
    }

    fn verify_otp(
        &self,
        kind: OtpKind,
        identifier: &str,
        code_hash: &str,
        now: i64,
    ) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);
        let key = (kind.as_u8(), identifier.to_string());
        let code_hash = code_hash.to_string();

        async move {
            let mut guard = lock_state(&state)?;
            let entry = guard.entries.entry(key).or_default();

            let matches = entry.issued_at > now - constants::OTP_LIFETIME_SECS
                && !entry.verified
                && entry.retry < constants::OTP_MAX_RETRIES
                && entry.code_hash == code_hash;

            if matches {
                entry.verified = true;
            } else {
                entry.retry += 1;
            }

            Ok(matches)
        }
    }

    fn record_ip_send(
        &self,
        ip: IpAddr,
        _window_seconds: i64,
    ) -> impl Future<Output = Result<i64>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock_state(&state)?;
            let count = guard.ip_sends.entry(ip).or_insert(0);
            *count += 1;
            Ok(*count)
        }
    }
}
