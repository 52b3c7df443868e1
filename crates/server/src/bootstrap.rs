use std::sync::Arc;

use axum::{http::header::InvalidHeaderValue, Router};
use perfumery_core::config::{AppConfig, ConfigError};
use perfumery_db::{connect_with_settings, migrations, DbPool, SqlProductRepository};
use thiserror::Error;
use tracing::info;

use crate::app;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("frontend origin is not a valid CORS header value: {0}")]
    Cors(#[source] InvalidHeaderValue),
}

/// Builds the application from an already loaded config. The config is validated
/// again so that programmatically assembled configs get the same checks as loaded ones.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let repository = Arc::new(SqlProductRepository::new(db_pool.clone()));
    let router = app::router(&config.server, repository, db_pool.clone())
        .map_err(BootstrapError::Cors)?;
    info!(
        event_name = "system.bootstrap.routes_ready",
        correlation_id = "bootstrap",
        cors_origin = config.server.cors_origin().unwrap_or("disabled"),
        "catalog routes ready"
    );

    Ok(Application { config, db_pool, router })
}
