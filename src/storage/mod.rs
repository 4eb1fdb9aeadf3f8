//! Persistence: repository contract and its SQLite / PostgreSQL backends

pub mod migrations;
pub mod postgres;
pub mod repository;
pub mod sqlite;

use std::sync::Arc;

use crate::core::config::DatabaseConfig;
use crate::core::error::AppResult;

// Re-exports for convenience
pub use postgres::PostgresRepository;
pub use repository::{ActionLogEntry, ContactRecord, Repository, TariffCounts, UserRecord};
pub use sqlite::{create_pool, get_connection, DbConnection, DbPool, SqliteRepository};

/// Opens the backend selected by configuration and brings its schema up to date
pub async fn open_repository(config: &DatabaseConfig) -> AppResult<Arc<dyn Repository>> {
    let repo: Arc<dyn Repository> = match config {
        DatabaseConfig::Sqlite { path } => Arc::new(SqliteRepository::open(path)?),
        DatabaseConfig::Postgres(pg) => Arc::new(PostgresRepository::connect(pg).await?),
    };
    log::info!("✅ Database initialized ({})", repo.backend());
    Ok(repo)
}
