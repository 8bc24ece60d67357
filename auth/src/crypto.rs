//! Credential hashing primitives.
//!
//! Secrets are stored as `salt ‖ derived_key` where the key is derived with
//! PBKDF2-HMAC-SHA256 at [`KDF_ITERATIONS`] rounds. A salt length of zero is
//! valid and produces a deterministic digest, used for OTP codes so the
//! stored digest can be compared server-side.

use crate::error::{AuthError, Result};
use constant_time_eq::constant_time_eq;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

/// PBKDF2 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;

/// Derived key length in bytes (SHA-256 output size).
const DERIVED_KEY_LEN: usize = 32;

/// Hash a secret with a freshly generated random salt of `salt_len` bytes.
///
/// Returns `salt ‖ derived_key`. A `salt_len` of zero yields an unsalted,
/// deterministic digest.
#[must_use]
pub fn hash_secret(secret: &str, salt_len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; salt_len];
    if salt_len > 0 {
        OsRng.fill_bytes(&mut salt);
    }

    let mut derived = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), &salt, KDF_ITERATIONS, &mut derived);

    let mut out = salt;
    out.extend_from_slice(&derived);
    out
}

/// Verify a secret against a stored `salt ‖ derived_key` value.
///
/// Re-derives from the extracted salt and compares in constant time; never
/// short-circuits on a byte mismatch.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] when the stored value is too short to
/// contain the salt and a full derived key; a malformed record is a caller
/// error, not a failed verification.
pub fn verify_secret(stored: &[u8], provided: &str, salt_len: usize) -> Result<bool> {
    if stored.len() != salt_len + DERIVED_KEY_LEN {
        return Err(AuthError::internal(format!(
            "Malformed stored secret: expected {} bytes, got {}",
            salt_len + DERIVED_KEY_LEN,
            stored.len()
        )));
    }

    let (salt, stored_key) = stored.split_at(salt_len);

    let mut derived = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(provided.as_bytes(), salt, KDF_ITERATIONS, &mut derived);

    Ok(constant_time_eq(stored_key, &derived))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_hash_verify_round_trip() {
        let stored = hash_secret("correct horse battery staple", 16);
        assert_eq!(stored.len(), 16 + 32);

        assert!(verify_secret(&stored, "correct horse battery staple", 16).unwrap());
        assert!(!verify_secret(&stored, "correct horse battery stable", 16).unwrap());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_same_password_hashes_differently() {
        // Random salt: two hashes of the same input must differ.
        let a = hash_secret("hunter2", 16);
        let b = hash_secret("hunter2", 16);
        assert_ne!(a, b);
        assert!(verify_secret(&a, "hunter2", 16).unwrap());
        assert!(verify_secret(&b, "hunter2", 16).unwrap());
    }

    #[test]
    fn test_zero_salt_is_deterministic() {
        // OTP codes rely on this to compare digests server-side.
        let a = hash_secret("0420", 0);
        let b = hash_secret("0420", 0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_malformed_stored_value_is_an_error() {
        let err = verify_secret(b"short", "password", 16);
        assert!(matches!(err, Err(AuthError::Internal(_))));
    }
}
