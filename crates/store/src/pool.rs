//! Connection pool setup and migration runner.

use harvestline_core::config::StorageConfig;
use harvestline_core::error::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Opens a connection pool sized for one worker process.
pub async fn connect(config: &StorageConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.connection_string())
        .await
        .map_err(|e| Error::store(format!("failed to connect to postgres: {e}")))
}

/// Applies all pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(Error::from)
}
