//! Custom Axum extractors: client IP and the JWT guards.

use crate::error::AppError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use std::net::IpAddr;
use tradelog_auth::guard::{AuthContext, TokenMode};
use tradelog_auth::AuthError;

/// Client IP address.
///
/// Prefers `X-Forwarded-For` (first entry), then `X-Real-IP`, then the
/// loopback fallback.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_client_ip(&parts.headers)))
    }
}

fn extract_client_ip(headers: &HeaderMap) -> IpAddr {
    if let Some(forwarded) = headers.get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                return ip;
            }
        }
    }

    IpAddr::from([127, 0, 0, 1])
}

/// Pull the bearer token out of the `Authorization` header.
///
/// # Errors
///
/// Returns `Unauthorized` when the header is missing or malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError(AuthError::unauthorized("Missing Authorization header")))?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError(AuthError::unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>",
        ))
    })
}

/// Access-mode guard: runs the full verification chain against the access
/// marker and attaches the identity.
#[derive(Debug, Clone)]
pub struct AccessUser(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for AccessUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let context = state.service.authenticate(token, TokenMode::Access).await?;
        Ok(Self(context))
    }
}

/// Refresh-mode guard: validates the refresh marker instead of the access
/// marker. Mounted only on the refresh route.
#[derive(Debug, Clone)]
pub struct RefreshUser(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for RefreshUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let context = state.service.authenticate(token, TokenMode::Refresh).await?;
        Ok(Self(context))
    }
}
