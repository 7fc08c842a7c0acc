//! Server State
//!
//! Everything a handler needs, built once at startup and cloned per request.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtService;
use crate::auth::jwt::JwtConfig;
use crate::cache::TtlCache;
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::admin;
use crate::services::{DepartmentService, IssueWorkflowService};
use shared::models::AdminStatus;
use tokio_util::sync::CancellationToken;

/// Shared application state
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | config | Config | Server configuration |
/// | db | DbService | SQLite pool |
/// | jwt_service | `Arc<JwtService>` | Token validation |
/// | cache | `Option<TtlCache>` | Department read cache, `None` when disabled |
/// | departments | DepartmentService | Department registry |
/// | issues | IssueWorkflowService | Issue status workflow |
/// | shutdown_token | CancellationToken | Stops background tasks |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub cache: Option<TtlCache>,
    pub departments: DepartmentService,
    pub issues: IssueWorkflowService,
    pub shutdown_token: CancellationToken,
}

impl ServerState {
    /// Assemble state around an existing database handle
    pub fn from_parts(config: Config, db: DbService, jwt_service: Arc<JwtService>) -> Self {
        let cache = (config.cache_ttl_secs > 0)
            .then(|| TtlCache::new(Duration::from_secs(config.cache_ttl_secs)));
        let departments = DepartmentService::new(db.pool.clone(), cache.clone());
        let issues = IssueWorkflowService::new(db.pool.clone());

        Self {
            config,
            db,
            jwt_service,
            cache,
            departments,
            issues,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Connect the store, seed the bootstrap administrator and build services
    ///
    /// The connection must succeed within `db_connect_timeout_secs`. In
    /// production a failure aborts startup. Elsewhere it is logged and the
    /// server starts on a lazy pool whose calls fail until the store is
    /// reachable.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let deadline = Duration::from_secs(config.db_connect_timeout_secs);
        let connected = match tokio::time::timeout(deadline, DbService::new(&config.database_path)).await {
            Ok(Ok(db)) => Ok(db),
            Ok(Err(e)) => Err(e.message),
            Err(_) => Err(format!("connection timed out after {}s", deadline.as_secs())),
        };

        let db = match connected {
            Ok(db) => db,
            Err(reason) if config.is_production() => {
                tracing::error!(path = %config.database_path, %reason, "Database unavailable");
                return Err(ServerError::Database(reason));
            }
            Err(reason) => {
                tracing::warn!(
                    path = %config.database_path,
                    %reason,
                    "Database unavailable, starting degraded"
                );
                DbService::lazy(&config.database_path)
                    .map_err(|e| ServerError::Database(e.message))?
            }
        };

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let state = Self::from_parts(config.clone(), db, jwt_service);
        state.bootstrap_admin().await;
        state.start_background_tasks();
        Ok(state)
    }

    /// State over a fresh in-memory database, for tests
    pub async fn for_tests(jwt: JwtConfig) -> Result<Self> {
        let config = Config::for_tests(jwt);
        let db = DbService::in_memory()
            .await
            .map_err(|e| ServerError::Database(e.message))?;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Ok(Self::from_parts(config, db, jwt_service))
    }

    /// Seed an administrator from `ADMIN_BOOTSTRAP_EMAIL` when none exists
    async fn bootstrap_admin(&self) {
        let Some(email) = &self.config.admin_bootstrap_email else {
            return;
        };

        match admin::count(&self.db.pool).await {
            Ok(0) => {}
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping admin bootstrap");
                return;
            }
        }

        match admin::create(
            &self.db.pool,
            &self.config.admin_bootstrap_name,
            email,
            "super_admin",
            AdminStatus::Active,
        )
        .await
        {
            Ok(record) => tracing::info!(admin_id = record.id, email = %record.email, "Bootstrap administrator created"),
            Err(e) => tracing::warn!(error = %e, "Failed to create bootstrap administrator"),
        }
    }

    /// Periodic cache purge, stopped by [`ServerState::shutdown`]
    fn start_background_tasks(&self) {
        if let Some(cache) = &self.cache {
            let every = Duration::from_secs(self.config.cache_ttl_secs);
            cache.spawn_purger(every, self.shutdown_token.clone());
            tracing::debug!(every_secs = every.as_secs(), "Cache purger started");
        }
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// Stop background tasks and release the connection pool
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        self.db.close().await;
        tracing::info!("Database pool closed");
    }
}
