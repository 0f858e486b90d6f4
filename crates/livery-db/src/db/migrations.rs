use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::error::{DbError, DbResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// ## Summary
/// Applies every pending embedded migration and returns the applied versions.
///
/// Migrations run on a dedicated connection on the blocking pool.
///
/// ## Errors
/// Returns `DbError::ConnectionError` if the database is unreachable and
/// `DbError::MigrationError` if a migration fails.
#[tracing::instrument(skip(database_url))]
pub async fn run_pending_migrations(database_url: &str) -> DbResult<Vec<String>> {
    let database_url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || -> DbResult<Vec<String>> {
        use diesel::Connection;

        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| DbError::MigrationError(err.to_string()))?;
        Ok(versions.iter().map(ToString::to_string).collect())
    })
    .await
    .map_err(|err| DbError::MigrationError(err.to_string()))??;

    tracing::info!(count = applied.len(), "Applied pending migrations");
    Ok(applied)
}
