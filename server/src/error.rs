//! Error-to-response bridging.

use crate::response::Envelope;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tradelog_auth::AuthError;

/// Wrapper turning domain errors into envelope responses.
#[derive(Debug)]
pub struct AppError(pub AuthError);

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;

        // Internal failures are the only ones that break the 200 envelope
        // contract; their detail stays in the logs.
        let status = if err.is_internal() {
            tracing::error!(error = %err, "Internal error");
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            tracing::debug!(code = err.code(), error = %err, "Domain error");
            StatusCode::OK
        };

        let message = if err.is_internal() {
            err.status().to_string()
        } else {
            err.to_string()
        };

        let envelope = Envelope::new(err.code(), message, err.data());
        (status, Json(envelope)).into_response()
    }
}

/// Handler result alias.
pub type AppResult<T> = Result<T, AppError>;
