use crate::auth::JwtConfig;
use crate::core::ServerError;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 3000 | HTTP port |
/// | DATABASE_PATH | civic.db | SQLite file (`:memory:` for an in-memory store) |
/// | ENVIRONMENT | development | development / staging / production |
/// | DB_CONNECT_TIMEOUT_SECS | 10 | Startup connect deadline |
/// | CACHE_TTL_SECS | 300 | Department read cache TTL, `0` disables |
/// | LOG_LEVEL | info | Default tracing level |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | - | Daily rolling log directory |
/// | ADMIN_BOOTSTRAP_EMAIL | - | Seed an administrator when none exists |
/// | ADMIN_BOOTSTRAP_NAME | Administrator | Name for the seeded administrator |
/// | JWT_* | see [`JwtConfig`] | Token settings |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/data/civic.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// SQLite database path
    pub database_path: String,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Deadline for the initial store connection (seconds)
    pub db_connect_timeout_secs: u64,
    /// Department cache TTL (seconds), 0 disables the cache
    pub cache_ttl_secs: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub admin_bootstrap_email: Option<String>,
    pub admin_bootstrap_name: String,
    /// JWT settings
    pub jwt: JwtConfig,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Unset variables fall back to defaults. Fails only when the JWT secret
    /// is unusable outside development.
    pub fn from_env() -> Result<Self, ServerError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig::from_env(&environment)
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            http_port: env_parse("HTTP_PORT", 3000),
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "civic.db".into()),
            db_connect_timeout_secs: env_parse("DB_CONNECT_TIMEOUT_SECS", 10),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", 300),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            admin_bootstrap_email: std::env::var("ADMIN_BOOTSTRAP_EMAIL")
                .ok()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            admin_bootstrap_name: std::env::var("ADMIN_BOOTSTRAP_NAME")
                .unwrap_or_else(|_| "Administrator".into()),
            environment,
            jwt,
        })
    }

    /// In-memory configuration for tests
    pub fn for_tests(jwt: JwtConfig) -> Self {
        Self {
            http_port: 0,
            database_path: ":memory:".into(),
            environment: "test".into(),
            db_connect_timeout_secs: 5,
            cache_ttl_secs: 300,
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            admin_bootstrap_email: None,
            admin_bootstrap_name: "Administrator".into(),
            jwt,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
