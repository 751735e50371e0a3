//! Connection pool setup.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a `SQLite` connection pool at `path`, creating the file if needed.
///
/// `:memory:` opens a private in-memory database. It is limited to a single
/// connection so concurrent writers queue on the pool instead of hitting
/// shared-cache table locks.
pub async fn open_pool(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path_str = path.as_ref().to_str().ok_or_else(|| {
        DatabaseError::Open("invalid database path: not valid UTF-8".to_string())
    })?;
    let in_memory = path_str == ":memory:";

    let mut connect_options = SqliteConnectOptions::from_str(path_str)
        .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { MAX_CONNECTIONS })
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to initialize pool: {e}")))?;

    tracing::info!("Database pool created at {}", path_str);
    Ok(pool)
}
