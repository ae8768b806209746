use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

/// Open a connection pool for `database_url`.
///
/// In-memory databases live inside a single connection, so the pool is
/// pinned to one connection that is never recycled.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let mut options = SqliteConnectOptions::from_str(database_url)?
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(300))
    };

    let pool = pool_options.connect_with(options).await?;
    tracing::debug!(in_memory, "database pool ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Pool with the schema applied, for tests and one-off tools.
pub async fn memory_pool() -> Result<SqlitePool, anyhow::Error> {
    let pool = create_pool("sqlite::memory:").await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
