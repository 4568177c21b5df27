use anyhow::{Context, Result};

mod logging;

pub use logging::LoggingConfig;

// ============================================================================
// Configuration Constants
// ============================================================================

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WS_PORT: u16 = 8081;

const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_JWT_ISSUER: &str = "project-chat";

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Upper bound on trimmed message content, in characters
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Page size used when the caller does not pass `limit`
pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

pub const MAX_SEARCH_RESULTS: i64 = 50;

// A 2000-char message plus envelope fits comfortably; anything larger is garbage or abuse.
pub const MAX_WEBSOCKET_FRAME_SIZE: usize = 64 * 1024;

// ============================================================================
// Configuration Structures
// ============================================================================

/// Database connection pool configuration
#[derive(Clone, Debug)]
pub struct DbConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool (seconds)
    pub acquire_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db: DbConfig,
    /// REST API port
    pub port: u16,
    /// WebSocket gateway port
    pub ws_port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl_hours: i64,
    /// Gate `join_project` behind the access check as well as send/list
    pub strict_room_join: bool,
    pub rust_log: String,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db: DbConfig {
                max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
                acquire_timeout_secs: env_parse(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
                ),
            },
            port: env_parse("PORT", DEFAULT_PORT),
            ws_port: env_parse("WS_PORT", DEFAULT_WS_PORT),
            jwt_secret,
            jwt_issuer: std::env::var("JWT_ISSUER")
                .unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            access_token_ttl_hours: env_parse(
                "ACCESS_TOKEN_TTL_HOURS",
                DEFAULT_ACCESS_TOKEN_TTL_HOURS,
            ),
            strict_room_join: env_parse("CHAT_STRICT_ROOM_JOIN", false),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            logging: LoggingConfig::from_env()?,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
