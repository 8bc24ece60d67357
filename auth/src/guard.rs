//! Bearer-token verification chain.
//!
//! Every protected request runs the same state machine: verify
//! signature/expiry → extract claims → look up the session (cache-backed) →
//! compare the embedded marker against the stored one → check the user is
//! still active → hand back the identity. Any failing step is
//! `Unauthorized`; an expired signature is distinguished so clients can
//! refresh.

use crate::error::{AuthError, Result};
use crate::state::{SessionData, SessionId, UserId, UserInfo};
use crate::token::{TokenSigner, TokenType};
use std::future::Future;

/// Which marker a presented token is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Check `aid` against the stored access marker.
    Access,

    /// Check `rid` against the stored refresh marker. Only the refresh
    /// route runs in this mode.
    Refresh,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// The authenticated user.
    pub user: UserInfo,

    /// The session the token belongs to.
    pub session_id: SessionId,
}

/// The two storage lookups the guard needs, implemented by whichever store
/// composition is active.
pub trait JwtStorage: Send + Sync {
    /// Fetch the live session's marker view; `None` when the session is
    /// absent, soft-deleted, or past the session lifetime.
    ///
    /// # Errors
    ///
    /// Returns error on storage failure.
    fn session_for(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Option<SessionData>>> + Send;

    /// Fetch the user's public info; `None` when the user is absent,
    /// soft-deleted, or blocked.
    ///
    /// # Errors
    ///
    /// Returns error on storage failure.
    fn user_for(&self, user_id: UserId)
    -> impl Future<Output = Result<Option<UserInfo>>> + Send;
}

/// Run the full verification chain for a presented bearer token.
///
/// # Errors
///
/// - [`AuthError::TokenExpired`] for a valid signature past its expiry.
/// - [`AuthError::Unauthorized`] for every other failure: bad signature,
///   type mismatch, unknown/stale session, marker mismatch, inactive user.
/// - [`AuthError::Internal`] on storage failure.
pub async fn authenticate<J: JwtStorage>(
    signer: &TokenSigner,
    storage: &J,
    token: &str,
    mode: TokenMode,
) -> Result<AuthContext> {
    let expected = match mode {
        TokenMode::Access => TokenType::Access,
        TokenMode::Refresh => TokenType::Refresh,
    };
    let claims = signer.verify(token, expected)?;

    let user_id = UserId(claims.sub);
    let session_id = SessionId(claims.sid);

    let session = storage
        .session_for(user_id, session_id)
        .await?
        .ok_or_else(|| AuthError::unauthorized("The session was not found in storage."))?;

    match mode {
        TokenMode::Access => {
            if claims.aid != Some(session.access_id) {
                return Err(AuthError::unauthorized("Access id does not match."));
            }
        }
        TokenMode::Refresh => {
            if claims.rid != Some(session.refresh_id) {
                return Err(AuthError::unauthorized("Refresh id does not match."));
            }
        }
    }

    let user = storage.user_for(user_id).await?.ok_or_else(|| {
        AuthError::unauthorized("User not found in storage, or the user has been deleted or blocked.")
    })?;

    Ok(AuthContext {
        user,
        session_id: session.session_id,
    })
}
