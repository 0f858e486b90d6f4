use anyhow::Context;

use livery_core::config::{Settings, StorageBackend};
use livery_db::db::{PgStore, create_pool};
use livery_service::EventEngine;

/// ## Summary
/// Builds the engine over the configured PostgreSQL database.
///
/// Each process would start with an empty in-memory store, so the `memory`
/// backend has nothing to serve from the command line.
///
/// ## Errors
/// Returns an error if the `memory` backend is configured or the pool cannot
/// be created.
pub async fn connect(settings: &Settings) -> anyhow::Result<EventEngine<PgStore>> {
    ensure_persistent(settings)?;

    let engine_config = settings.engine.clone();
    let lock_timeout = engine_config.lock_timeout();
    let url = database_url(settings)?;
    let pool = create_pool(url, u32::from(settings.database.max_connections)).await?;

    tracing::info!("Database connection pool created");

    Ok(EventEngine::new(PgStore::new(pool, lock_timeout), engine_config))
}

/// ## Summary
/// Rejects storage backends that keep nothing between runs.
///
/// ## Errors
/// Returns an error naming the setting to change when `database.backend` is `memory`.
pub fn ensure_persistent(settings: &Settings) -> anyhow::Result<()> {
    match settings.database.backend {
        StorageBackend::Postgres => Ok(()),
        StorageBackend::Memory => anyhow::bail!(
            "the memory backend keeps no events between runs; set database.backend = \"postgres\" \
             (LIVERY_DATABASE__BACKEND=postgres) and database.url"
        ),
    }
}

/// ## Summary
/// Returns the configured PostgreSQL URL.
///
/// ## Errors
/// Returns an error if `database.url` is unset.
pub fn database_url(settings: &Settings) -> anyhow::Result<&str> {
    settings
        .database
        .url
        .as_deref()
        .context("database.url is required for the postgres backend")
}
