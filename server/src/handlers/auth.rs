//! Auth endpoints.
//!
//! Handlers are thin: validate the shape, call the engine, wrap the outcome
//! in the envelope. The guards in [`crate::extractors`] run the token
//! verification chain before a protected handler executes.

use crate::error::{AppError, AppResult};
use crate::extractors::{AccessUser, ClientIp, RefreshUser, bearer_token};
use crate::response::Envelope;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::json;
use tradelog_auth::AuthError;
use tradelog_auth::state::{OtpKind, UserInfo};

const MIN_PASSWORD_LEN: usize = 8;

fn validate_email(email: &str) -> Result<(), AppError> {
    let well_formed = email.len() >= 3
        && email.len() <= 320
        && email.split('@').count() == 2
        && !email.starts_with('@')
        && !email.ends_with('@');

    if well_formed {
        Ok(())
    } else {
        Err(AppError(AuthError::UnprocessableEntity(
            "Invalid email address.".to_string(),
        )))
    }
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(AppError(AuthError::UnprocessableEntity(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        ))))
    }
}

fn parse_otp_kind(typ: u8) -> Result<OtpKind, AppError> {
    match typ {
        0 => Ok(OtpKind::Register),
        _ => Err(AppError(AuthError::UnprocessableEntity(
            "Unknown OTP type.".to_string(),
        ))),
    }
}

/// Send-OTP request body.
#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    /// Identifier to prove control of.
    pub email: String,
    /// OTP kind discriminator.
    pub typ: u8,
}

/// `POST /auth/send-otp`
pub async fn send_otp(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<SendOtpRequest>,
) -> AppResult<Json<Envelope>> {
    validate_email(&request.email)?;
    let kind = parse_otp_kind(request.typ)?;

    state.service.send_otp(client_ip.0, kind, &request.email).await?;

    Ok(Json(Envelope::ok(json!({}))))
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email identity.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// OTP code previously sent to the email.
    pub otp_code: String,
    /// Client device label.
    pub device_name: String,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<Envelope>> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let (user, pair) = state
        .service
        .register(
            &request.email,
            &request.password,
            &request.otp_code,
            client_ip.0,
            &request.device_name,
        )
        .await?;

    Ok(Json(Envelope::created(json!({
        "user": UserInfo::from(&user),
        "access_token": pair.access_token,
        "refresh_token": pair.refresh_token,
        "access_token_expiry": pair.access_expires_at,
    }))))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email identity.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Client device label.
    pub device_name: String,
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Envelope>> {
    validate_email(&request.email)?;

    let (user, pair) = state
        .service
        .login(
            &request.email,
            &request.password,
            client_ip.0,
            &request.device_name,
        )
        .await?;

    Ok(Json(Envelope::ok(json!({
        "user": UserInfo::from(&user),
        "access_token": pair.access_token,
        "refresh_token": pair.refresh_token,
        "access_token_expiry": pair.access_expires_at,
    }))))
}

/// `POST /auth/logout`
///
/// Best effort: an absent or stale token still yields a clean 200 so the
/// client can drop its credentials.
pub async fn logout(
    State(state): State<AppState>,
    user: Option<AccessUser>,
) -> Json<Envelope> {
    if let Some(AccessUser(context)) = user {
        if let Err(e) = state
            .service
            .logout(context.user.user_id, context.session_id)
            .await
        {
            tracing::error!(error = %e, "Failed to logout");
        }
    }

    Json(Envelope::ok(json!({})))
}

/// `POST /auth/refresh-token`
pub async fn refresh_token(
    State(state): State<AppState>,
    RefreshUser(context): RefreshUser,
) -> AppResult<Json<Envelope>> {
    let pair = state
        .service
        .refresh_token(context.user.user_id, context.session_id)
        .await?;

    Ok(Json(Envelope::ok(json!({
        "access_token": pair.access_token,
        "refresh_token": pair.refresh_token,
        "access_token_expiry": pair.access_expires_at,
    }))))
}

/// `POST /auth/heartbeat`
pub async fn heartbeat(
    State(state): State<AppState>,
    client_ip: ClientIp,
    AccessUser(context): AccessUser,
) -> AppResult<Json<Envelope>> {
    state
        .service
        .heartbeat(context.user.user_id, context.session_id, client_ip.0)
        .await?;

    Ok(Json(Envelope::ok(json!({}))))
}

/// `POST /auth/me`
pub async fn me(AccessUser(context): AccessUser) -> Json<Envelope> {
    Json(Envelope::ok(json!({ "user": context.user })))
}

/// Check-email request body.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    /// Email to probe.
    pub email: String,
}

/// `POST /auth/check-email`
pub async fn check_email(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<Envelope>> {
    validate_email(&request.email)?;
    state.service.check_email(&request.email).await?;

    Ok(Json(Envelope::ok(json!({}))))
}

/// `POST /auth/send-reset-password-link`
pub async fn send_reset_password_link(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<Envelope>> {
    validate_email(&request.email)?;
    state
        .service
        .send_reset_password_link(client_ip.0, &request.email)
        .await?;

    Ok(Json(Envelope::ok(json!({}))))
}

/// Reset-password request body.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    /// Replacement password.
    pub password: String,
}

/// `POST /auth/reset-password`
///
/// The bearer token here is the signed reset token; only its signature and
/// expiry are checked up front; the single-use reset session in storage is
/// the authority.
pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<Envelope>> {
    validate_password(&request.password)?;

    let token = bearer_token(&headers)?;
    let (user_id, reset_session_id) = state.service.verify_reset_token(token)?;

    state
        .service
        .reset_password(user_id, reset_session_id, &request.password)
        .await?;

    Ok(Json(Envelope::ok(json!({}))))
}
