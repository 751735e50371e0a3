//! Scout Database Layer
//!
//! Provides `SQLite` persistence for session credentials, normalized listings
//! and their evaluations. Uses `SQLx` with embedded migrations.
//!
//! # Transactions
//!
//! Entity operations take an explicit `&mut SqliteConnection`. Callers open a
//! transaction with [`Database::begin`] and pass `&mut *tx`, so every write
//! happens inside a scope the caller commits:
//!
//! ```ignore
//! use scout_db::{credentials, Database};
//!
//! let db = Database::new("scout.db").await?;
//! db.run_migrations().await?;
//!
//! let mut tx = db.begin().await?;
//! credentials::replace_all(&mut tx, &cookies).await?;
//! tx.commit().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod credentials;
pub mod error;
pub mod evaluations;
pub mod listings;
pub mod migrations;

pub use error::{DatabaseError, Result};
pub use evaluations::RankedListing;

use sqlx::{Pool, Sqlite, Transaction};
use std::path::Path;

/// High-level database handle owning the connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the database at `path`.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Open the database and bring its schema up to date.
    pub async fn open_and_migrate(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::new(path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Begin a transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
