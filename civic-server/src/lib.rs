//! Civic Server - department registry and issue workflow API
//!
//! # Module layout
//!
//! ```text
//! civic-server/src/
//! ├── core/          # config, state, errors, server loop
//! ├── auth/          # JWT, admin / department guards, principals
//! ├── db/            # SQLite pool and repositories
//! ├── services/      # department registry, issue workflow
//! ├── api/           # HTTP routes and handlers
//! ├── middleware/    # request logging
//! ├── cache.rs       # TTL key/value cache
//! └── utils/         # logger
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod core;
pub mod db;
pub mod middleware;
pub mod services;
pub mod utils;

// Re-export common types
pub use auth::{AdminPrincipal, CurrentUser, DepartmentPrincipal, JwtService};
pub use core::{Config, Server, ServerState};
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
