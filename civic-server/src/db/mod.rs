//! Database Module
//!
//! Handles SQLite connection pool and migrations

pub mod repository;

use shared::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Path value selecting a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Database service, owns the SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (creating if missing) the database and apply migrations
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let pool = pool_options(db_path)
            .connect_with(connect_options(db_path)?)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!(path = %db_path, "Database connection established");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Fresh in-memory database with migrations applied
    pub async fn in_memory() -> Result<Self, AppError> {
        Self::new(IN_MEMORY).await
    }

    /// Pool that connects on first use
    ///
    /// Used when the startup connection failed outside production. No
    /// migrations run on this pool, so store calls and [`DbService::ping`]
    /// keep failing until the server is restarted against a reachable store.
    pub fn lazy(db_path: &str) -> Result<Self, AppError> {
        let pool = pool_options(db_path).connect_lazy_with(connect_options(db_path)?);
        Ok(Self { pool })
    }

    /// Round-trip to the store, returning its latency
    ///
    /// Fails when the store is reachable but the schema is missing.
    pub async fn ping(&self) -> Result<Duration, AppError> {
        let start = Instant::now();
        let tables = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'department'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        if tables == 0 {
            return Err(AppError::database("Database schema missing"));
        }
        Ok(start.elapsed())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn connect_options(db_path: &str) -> Result<SqliteConnectOptions, AppError> {
    if db_path == IN_MEMORY {
        return SqliteConnectOptions::from_str("sqlite::memory:")
            .map(|o| o.foreign_keys(true))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")));
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
        .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        // Wait on write conflicts instead of failing immediately
        .busy_timeout(Duration::from_secs(5))
        .optimize_on_close(true, None);
    Ok(options)
}

fn pool_options(db_path: &str) -> SqlitePoolOptions {
    if db_path == IN_MEMORY {
        // Every connection to :memory: is a separate database; keep exactly one alive
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
    }
}
