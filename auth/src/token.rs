//! ES256 bearer token signing and verification.
//!
//! Access and refresh tokens share one claim layout and are distinguished by
//! the `typ` claim, not a separate mechanism. Both carry the session id and
//! the current marker pair; the guard compares the marker matching the token
//! type against storage. Reset-password tokens reuse the access type with an
//! `email` claim and no markers.

use crate::config::AuthConfig;
use crate::constants;
use crate::error::{AuthError, Result};
use crate::state::{SessionId, SessionMarkers, TokenPair, UserId};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token type claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token accepted by every protected route.
    Access,

    /// Long-lived token accepted only by the refresh route.
    Refresh,
}

/// Claims embedded in every signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: i64,

    /// Session id.
    pub sid: Uuid,

    /// Access marker (absent on reset tokens).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aid: Option<Uuid>,

    /// Refresh marker (absent on reset tokens).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<Uuid>,

    /// Email, carried by reset-password tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Token type.
    pub typ: TokenType,

    /// Whether the token came from a fresh credential exchange (login or
    /// register) rather than a refresh.
    pub fresh: bool,

    /// Issued-at (epoch seconds).
    pub iat: i64,

    /// Expiry (epoch seconds).
    pub exp: i64,
}

/// ES256 signer/verifier over a single elliptic-curve key pair.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime: i64,
    refresh_lifetime: i64,
}

impl TokenSigner {
    /// Create a signer from PEM-encoded EC keys.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] when either PEM is not a valid
    /// elliptic-curve key.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8], config: &AuthConfig) -> Result<Self> {
        let encoding = EncodingKey::from_ec_pem(private_pem)
            .map_err(|e| AuthError::internal(format!("Invalid EC private key: {e}")))?;
        let decoding = DecodingKey::from_ec_pem(public_pem)
            .map_err(|e| AuthError::internal(format!("Invalid EC public key: {e}")))?;

        Ok(Self {
            encoding,
            decoding,
            access_lifetime: config.access_token_lifetime,
            refresh_lifetime: config.refresh_token_lifetime,
        })
    }

    /// Sign an access/refresh pair for a session and its current markers.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] when signing fails.
    pub fn generate_pair(
        &self,
        user_id: UserId,
        session_id: SessionId,
        markers: SessionMarkers,
        fresh: bool,
        now: i64,
    ) -> Result<TokenPair> {
        let access_exp = now + self.access_lifetime;
        let access = Claims {
            sub: user_id.0,
            sid: session_id.0,
            aid: Some(markers.access_id),
            rid: Some(markers.refresh_id),
            email: None,
            typ: TokenType::Access,
            fresh,
            iat: now,
            exp: access_exp,
        };

        let refresh = Claims {
            typ: TokenType::Refresh,
            fresh: false,
            exp: now + self.refresh_lifetime,
            ..access.clone()
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            access_expires_at: access_exp,
        })
    }

    /// Sign a single-purpose reset-password token embedding the reset
    /// session id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] when signing fails.
    pub fn generate_reset_token(
        &self,
        user_id: UserId,
        email: &str,
        reset_session_id: SessionId,
        now: i64,
    ) -> Result<String> {
        let claims = Claims {
            sub: user_id.0,
            sid: reset_session_id.0,
            aid: None,
            rid: None,
            email: Some(email.to_string()),
            typ: TokenType::Access,
            fresh: true,
            iat: now,
            exp: now + constants::RESET_PASSWORD_LIFETIME_SECS,
        };

        self.sign(&claims)
    }

    /// Verify signature and expiry, then check the `typ` claim.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TokenExpired`] for a valid signature past its expiry.
    /// - [`AuthError::Unauthorized`] for any other verification failure or a
    ///   type mismatch.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let validation = Validation::new(Algorithm::ES256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                AuthError::TokenExpired
            } else {
                AuthError::unauthorized(format!("Invalid token: {e}"))
            }
        })?;

        if data.claims.typ != expected {
            return Err(AuthError::unauthorized("Token type mismatch"));
        }

        Ok(data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::ES256), claims, &self.encoding)
            .map_err(|e| AuthError::internal(format!("Failed to sign token: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &str = include_str!("../tests/keys/es256_private.pem");
    const PUBLIC_PEM: &str = include_str!("../tests/keys/es256_public.pem");

    fn signer() -> TokenSigner {
        TokenSigner::from_pem(
            PRIVATE_PEM.as_bytes(),
            PUBLIC_PEM.as_bytes(),
            &AuthConfig::default(),
        )
        .unwrap()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_pair_round_trip() {
        let signer = signer();
        let session_id = SessionId::new();
        let markers = SessionMarkers::new();

        let pair = signer
            .generate_pair(UserId(42), session_id, markers, true, now())
            .unwrap();

        let access = signer.verify(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(access.sub, 42);
        assert_eq!(access.sid, session_id.0);
        assert_eq!(access.aid, Some(markers.access_id));
        assert!(access.fresh);

        let refresh = signer
            .verify(&pair.refresh_token, TokenType::Refresh)
            .unwrap();
        assert_eq!(refresh.rid, Some(markers.refresh_id));
        assert!(!refresh.fresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_type_claim_is_enforced() {
        let signer = signer();
        let pair = signer
            .generate_pair(UserId(1), SessionId::new(), SessionMarkers::new(), true, now())
            .unwrap();

        // An access token must not pass a refresh-mode check and vice versa.
        assert!(matches!(
            signer.verify(&pair.access_token, TokenType::Refresh),
            Err(AuthError::Unauthorized(_))
        ));
        assert!(matches!(
            signer.verify(&pair.refresh_token, TokenType::Access),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_is_distinguished_from_invalid() {
        let signer = signer();
        let issued = now() - 7200;
        let pair = signer
            .generate_pair(UserId(1), SessionId::new(), SessionMarkers::new(), true, issued)
            .unwrap();

        assert!(matches!(
            signer.verify(&pair.access_token, TokenType::Access),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            signer.verify("not-a-token", TokenType::Access),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_reset_token_carries_email_and_session() {
        let signer = signer();
        let reset_sid = SessionId::new();
        let token = signer
            .generate_reset_token(UserId(9), "trader@example.com", reset_sid, now())
            .unwrap();

        let claims = signer.verify(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sid, reset_sid.0);
        assert_eq!(claims.email.as_deref(), Some("trader@example.com"));
        assert_eq!(claims.aid, None);
    }
}
