//! Tradelog auth server binary.

mod config;
mod error;
mod extractors;
mod handlers;
mod response;
mod routes;
mod state;

use anyhow::Context;
use config::ServerConfig;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tradelog_auth::providers::{HttpGeoLocator, SmtpEmailSender};
use tradelog_auth::repository::AuthRepository;
use tradelog_auth::stores::{
    self, PostgresSessionStore, PostgresUserStore, RedisLoginAttempts, RedisOtpStore,
    RedisResetStore, RedisSessionCache, RedisSessionLock,
};
use tradelog_auth::{AuthService, TokenSigner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    stores::postgres::migrate(&pool)
        .await
        .context("Failed to run migrations")?;

    let redis = stores::connect_redis(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;

    let signer = TokenSigner::from_pem(
        &config.jwt_private_pem,
        &config.jwt_public_pem,
        &config.auth,
    )
    .context("Failed to load token signing keys")?;

    let email = SmtpEmailSender::new(
        &config.smtp_server,
        config.smtp_port,
        config.smtp_username.clone(),
        config.smtp_password.clone(),
        config.email_from.clone(),
    )
    .map_err(anyhow::Error::msg)
    .context("Failed to build SMTP transport")?;

    let repo = AuthRepository::new(
        PostgresUserStore::new(pool.clone()),
        PostgresSessionStore::new(pool),
        RedisSessionCache::new(redis.clone()),
        &config.auth,
    );

    let service = AuthService::new(
        repo,
        RedisOtpStore::new(redis.clone()),
        RedisLoginAttempts::new(redis.clone()),
        RedisResetStore::new(redis.clone()),
        RedisSessionLock::new(redis),
        email,
        HttpGeoLocator::new(config.geo_api_url.clone()),
        signer,
        config.auth.clone(),
    );

    let app = routes::router(AppState {
        service: Arc::new(service),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    tracing::info!(addr = %config.listen_addr, "Tradelog auth server listening");
    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}
