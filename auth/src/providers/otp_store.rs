//! OTP session store trait.

use crate::error::Result;
use crate::state::OtpKind;
use std::future::Future;
use std::net::IpAddr;

/// OTP state keyed by `(kind, identifier)`.
///
/// Both mutations are single atomic server-side operations: two racing
/// requests must never both pass the cooldown check or both consume a retry.
pub trait OtpStore: Send + Sync {
    /// Store a fresh OTP digest unless an unexpired one is still inside its
    /// send cooldown.
    ///
    /// Returns `Some(expiry)` when the code was written, `None` when a prior
    /// send is still cooling down.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn save_otp(
        &self,
        kind: OtpKind,
        identifier: &str,
        code_hash: &str,
        now: i64,
    ) -> impl Future<Output = Result<Option<i64>>> + Send;

    /// Verify a code digest against the stored OTP.
    ///
    /// Atomically checks issue window, unverified status, retry budget, and
    /// digest equality; on success flips the status to verified, on failure
    /// burns one retry. Returns `true` exactly once per OTP.
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn verify_otp(
        &self,
        kind: OtpKind,
        identifier: &str,
        code_hash: &str,
        now: i64,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Record an OTP send from a source IP, returning the count inside the
    /// window (including this send).
    ///
    /// # Errors
    ///
    /// Returns error on cache failure.
    fn record_ip_send(
        &self,
        ip: IpAddr,
        window_seconds: i64,
    ) -> impl Future<Output = Result<i64>> + Send;
}
