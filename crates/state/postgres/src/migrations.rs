use sqlx::PgPool;
use tracing::warn;

use crate::config::PostgresConfig;

/// Run database migrations, creating the required tables if they do not
/// exist.
///
/// The files table carries a unique constraint on `hash`: under concurrent
/// uploads of the same new content, the second writer's insert fails as a
/// unique violation and is surfaced as a duplicate-detected outcome rather
/// than a second row.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let files_table = config.files_table();
    let analysis_table = config.analysis_table();

    let create_files = format!(
        "CREATE TABLE IF NOT EXISTS {files_table} (
            id UUID PRIMARY KEY,
            hash TEXT NOT NULL UNIQUE,
            upload_time TIMESTAMPTZ NOT NULL,
            name TEXT NOT NULL,
            locator TEXT NOT NULL
        )"
    );

    let create_analysis = format!(
        "CREATE TABLE IF NOT EXISTS {analysis_table} (
            id UUID PRIMARY KEY,
            word_count BIGINT NOT NULL,
            paragraph_count BIGINT NOT NULL,
            char_count BIGINT NOT NULL,
            upload_time TIMESTAMPTZ NOT NULL,
            hash TEXT NOT NULL
        )"
    );

    sqlx::query(&create_files).execute(pool).await?;
    sqlx::query(&create_analysis).execute(pool).await?;

    Ok(())
}

/// Run migrations with a bounded fixed-delay retry loop.
///
/// Used once during process startup, before requests are accepted; the
/// database may still be coming up alongside the service. After
/// `config.migrate_attempts` failures the last error propagates and startup
/// fails fatally. Request-path operations never retry.
///
/// # Errors
///
/// Returns the final [`sqlx::Error`] once all attempts are exhausted.
pub async fn run_migrations_with_retry(
    pool: &PgPool,
    config: &PostgresConfig,
) -> Result<(), sqlx::Error> {
    let attempts = config.migrate_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match run_migrations(pool, config).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < attempts => {
                warn!(
                    attempt,
                    max_attempts = attempts,
                    delay = ?config.migrate_retry_delay,
                    error = %e,
                    "database migration failed, retrying"
                );
                tokio::time::sleep(config.migrate_retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
