//! Database connection pool management and schema migrations

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

use crate::{
    config::DatabaseConfig,
    error::{Error, Result},
};

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the connection pool (with retries) and bring the schema up to date
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = create_pool_with_retries(config, config.max_retries).await?;
    MIGRATOR.run(&pool).await?;
    tracing::info!("Database schema is up to date");
    Ok(pool)
}

/// Create a SQLite connection pool, retrying with exponential backoff
async fn create_pool_with_retries(config: &DatabaseConfig, max_retries: u32) -> Result<SqlitePool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Database connection pool created: max={}, min={}",
                        config.max_connections,
                        config.min_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));
                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Attempt to create a database pool (single try)
///
/// Each pooled connection to `sqlite::memory:` opens its own empty database,
/// so in-memory URLs should be paired with `max_connections = 1`.
async fn try_create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| Error::Database(format!("invalid database url '{}': {}", config.url, e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout())
        .connect_with(options)
        .await
        .map_err(|e| {
            Error::Database(format!(
                "failed to open database at '{}' ({}): {}",
                config.url,
                categorize_db_error(&e),
                e
            ))
        })
}

/// Categorize database error for better operator guidance
fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;
    match err {
        Error::Configuration(_) => "configuration error",
        Error::Database(_) => "database error",
        Error::Io(_) => "I/O error - check the path and its permissions",
        Error::PoolTimedOut => "connection pool timeout",
        Error::PoolClosed => "connection pool closed",
        Error::WorkerCrashed => "database worker crashed",
        _ => "connection error",
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(url: String) -> DatabaseConfig {
        DatabaseConfig {
            url,
            max_connections: 2,
            min_connections: 0,
            connection_timeout_secs: 5,
            max_retries: 0,
            retry_delay_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_connect_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.db");
        let config = config_for(format!("sqlite://{}", path.display()));

        let pool = connect(&config).await.unwrap();
        assert!(path.exists());

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('users', 'locations', 'user_locations', 'ads')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 4);

        // Migrations are idempotent across restarts
        MIGRATOR.run(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_url_is_database_error() {
        let config = config_for("postgres://localhost/nope".to_string());
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
