//! Admin-internal endpoints.
//!
//! Mounted under `/internal`; exposure control (network policy, reverse
//! proxy) is outside this service.

use crate::error::AppResult;
use crate::response::Envelope;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::json;
use tradelog_auth::UserId;

/// `POST /internal/users/:user_id/block`
pub async fn block_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Envelope>> {
    state.service.block_user(UserId(user_id)).await?;

    Ok(Json(Envelope::ok(json!({}))))
}

/// `POST /internal/users/:user_id/remove-sessions`
pub async fn remove_all_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Envelope>> {
    state.service.remove_all_sessions(UserId(user_id)).await?;

    Ok(Json(Envelope::ok(json!({}))))
}
