//! Server configuration loaded from environment variables.

use anyhow::Context;
use tradelog_auth::AuthConfig;

/// Everything the server needs to wire the engine.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub listen_addr: String,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Redis connection URL.
    pub redis_url: String,

    /// PEM-encoded EC private key for token signing.
    pub jwt_private_pem: Vec<u8>,

    /// PEM-encoded EC public key for token verification.
    pub jwt_public_pem: Vec<u8>,

    /// SMTP relay host.
    pub smtp_server: String,

    /// SMTP relay port.
    pub smtp_port: u16,

    /// SMTP username.
    pub smtp_username: String,

    /// SMTP password.
    pub smtp_password: String,

    /// Sender address for outgoing mail.
    pub email_from: String,

    /// Base URL of the geolocation lookup service.
    pub geo_api_url: String,

    /// Engine configuration.
    pub auth: AuthConfig,
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl ServerConfig {
    /// Load the configuration from the environment.
    ///
    /// | Env Var                | Required | Default                 |
    /// |------------------------|----------|-------------------------|
    /// | `DATABASE_URL`         | **yes**  | --                      |
    /// | `REDIS_URL`            | **yes**  | --                      |
    /// | `JWT_EC_PRIVATE_KEY`   | **yes**  | -- (path to PEM file)   |
    /// | `JWT_EC_PUBLIC_KEY`    | **yes**  | -- (path to PEM file)   |
    /// | `SMTP_SERVER`          | **yes**  | --                      |
    /// | `SMTP_USERNAME`        | **yes**  | --                      |
    /// | `SMTP_PASSWORD`        | **yes**  | --                      |
    /// | `EMAIL_FROM`           | **yes**  | --                      |
    /// | `RESET_PASSWORD_LINK`  | **yes**  | --                      |
    /// | `LISTEN_ADDR`          | no       | `0.0.0.0:8080`          |
    /// | `SMTP_PORT`            | no       | `587`                   |
    /// | `GEO_API_URL`          | no       | `http://ip-api.com`     |
    ///
    /// # Errors
    ///
    /// Returns error when a required variable is missing, a key file is
    /// unreadable, or a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let private_key_path = required("JWT_EC_PRIVATE_KEY")?;
        let public_key_path = required("JWT_EC_PUBLIC_KEY")?;

        let jwt_private_pem = std::fs::read(&private_key_path)
            .with_context(|| format!("Failed to read {private_key_path}"))?;
        let jwt_public_pem = std::fs::read(&public_key_path)
            .with_context(|| format!("Failed to read {public_key_path}"))?;

        let smtp_port: u16 = optional("SMTP_PORT", "587")
            .parse()
            .context("SMTP_PORT must be a valid port")?;

        Ok(Self {
            listen_addr: optional("LISTEN_ADDR", "0.0.0.0:8080"),
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_private_pem,
            jwt_public_pem,
            smtp_server: required("SMTP_SERVER")?,
            smtp_port,
            smtp_username: required("SMTP_USERNAME")?,
            smtp_password: required("SMTP_PASSWORD")?,
            email_from: required("EMAIL_FROM")?,
            geo_api_url: optional("GEO_API_URL", "http://ip-api.com"),
            auth: AuthConfig::new(required("RESET_PASSWORD_LINK")?),
        })
    }
}
