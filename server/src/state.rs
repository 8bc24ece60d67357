//! Shared application state.

use std::sync::Arc;
use tradelog_auth::AuthService;
use tradelog_auth::providers::{HttpGeoLocator, SmtpEmailSender};
use tradelog_auth::stores::{
    PostgresSessionStore, PostgresUserStore, RedisLoginAttempts, RedisOtpStore, RedisResetStore,
    RedisSessionCache, RedisSessionLock,
};

/// The concrete engine composition this server runs.
pub type Service = AuthService<
    PostgresUserStore,
    PostgresSessionStore,
    RedisSessionCache,
    RedisOtpStore,
    RedisLoginAttempts,
    RedisResetStore,
    RedisSessionLock,
    SmtpEmailSender,
    HttpGeoLocator,
>;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The auth engine.
    pub service: Arc<Service>,
}
