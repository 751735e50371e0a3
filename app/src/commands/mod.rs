//! Subcommand implementations.

pub mod discover;
pub mod evaluate;
pub mod review;

use anyhow::{Context, Result};
use scout_core::AppConfig;
use scout_db::Database;

/// Open the configured database, creating its directory and schema as needed.
pub async fn open_database(config: &AppConfig) -> Result<Database> {
    let path = config
        .database_path()
        .context("failed to resolve database path")?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Database::open_and_migrate(&path)
        .await
        .with_context(|| format!("failed to open database at {}", path.display()))
}
