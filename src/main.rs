//! Bonekit maintenance binary.
//!
//! Loads configuration, connects to the configured database, applies pending
//! migrations, compiles the configured named queries, and reports whether the
//! database is healthy.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt};

use bonekit_core::config::AppConfig;
use bonekit_core::error::AppError;
use bonekit_database::{DatabasePool, SqlContext};
use bonekit_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(kind = %e.kind, "{}", e.message);
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `BONEKIT_ENV`.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("BONEKIT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Bonekit v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;

    let migrations = Path::new(&config.database.migrations_dir);
    if migrations.is_dir() {
        run_migrations(db.pool(), migrations).await?;
    } else {
        tracing::info!(
            dir = %migrations.display(),
            "No migrations directory, skipping migrations"
        );
    }

    let context = SqlContext::new(db.pool().clone()).with_named_queries(config.named_queries);
    let named_queries = context.verify_named_queries().await?;

    let healthy = db.health_check().await?;
    tracing::info!(healthy, named_queries, "Database ready");

    db.close().await;
    if healthy {
        Ok(())
    } else {
        Err(AppError::invalid_state("Database health check returned an unexpected value"))
    }
}
