//! PostgreSQL store implementations.

pub mod sessions;
pub mod users;

pub use sessions::PostgresSessionStore;
pub use users::PostgresUserStore;

use crate::error::{AuthError, Result};
use sqlx::PgPool;

/// Run database migrations.
///
/// # Errors
///
/// Returns error if migrations fail.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AuthError::internal(format!("Migration failed: {e}")))?;
    Ok(())
}
