//! Route table.

use crate::handlers::{auth, internal};
use crate::state::AppState;
use axum::Router;
use axum::routing::post;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/send-otp", post(auth::send_otp))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/heartbeat", post(auth::heartbeat))
        .route("/me", post(auth::me))
        .route("/check-email", post(auth::check_email))
        .route(
            "/send-reset-password-link",
            post(auth::send_reset_password_link),
        )
        .route("/reset-password", post(auth::reset_password));

    let internal_routes = Router::new()
        .route("/users/:user_id/block", post(internal::block_user))
        .route(
            "/users/:user_id/remove-sessions",
            post(internal::remove_all_sessions),
        );

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/internal", internal_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
