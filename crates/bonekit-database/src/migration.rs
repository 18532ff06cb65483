//! Database migration runner.

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use tracing::info;

use bonekit_core::error::{AppError, ErrorKind};

/// Run all pending migrations found in `dir`.
pub async fn run_migrations(pool: &SqlitePool, dir: impl AsRef<Path>) -> Result<(), AppError> {
    let dir = dir.as_ref();
    info!(dir = %dir.display(), "Running database migrations...");

    let migrator = Migrator::new(dir).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Failed to load migrations from {}: {e}", dir.display()),
            e,
        )
    })?;

    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Persistence,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}
