//! SQLite connection pool.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::DbError;

/// Type alias for the store handle passed to every repository call.
pub type DbPool = SqlitePool;

/// Connection settings for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// e.g. `sqlite://tichete.db` or `sqlite::memory:`
    pub database_url: String,
    /// Pool ceiling. Ignored for in-memory databases, which use one connection.
    pub max_connections: u32,
    /// Create the database file when it does not exist yet.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://tichete.db".to_string(),
            max_connections: 5,
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// In-memory SQLite databases live and die with their connection.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

/// Create a new connection pool from `config`.
///
/// In-memory databases get a single connection that is never recycled, so
/// every unit of work sees the same data.
pub async fn create_pool(config: &StoreConfig) -> Result<DbPool, DbError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(config.create_if_missing);

    let mut pool_options = SqlitePoolOptions::new();
    if config.is_in_memory() {
        info!("Opening in-memory database");
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        info!(
            "Connecting to database (max_connections={})",
            config.max_connections
        );
        pool_options = pool_options.max_connections(config.max_connections);
    }

    let pool = pool_options.connect_with(options).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations located in `./migrations` (relative to the
/// workspace root at build time).
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    info!("Running database migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
