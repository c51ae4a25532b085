// src/config.rs

use std::{env, str::FromStr, thread, time::Duration};

use url::Url;

/// Default session lifetime: 7 days.
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 7 * 24;

/// Default deadline for quick store lookups and writes.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 3000;

/// Default deadline for resolving a token through the auth service.
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 3000;

/// Default deadline for a password hash or verify, including the wait for a slot.
pub const DEFAULT_HASH_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_SESSION_PURGE_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,

    /// How long a freshly issued session stays live.
    pub session_ttl: Duration,

    /// Ceiling on simultaneous password hash/verify operations.
    pub hash_concurrency: usize,
    pub hash_timeout: Duration,

    pub store_timeout: Duration,

    /// Base URL of the auth service. `None` resolves tokens in-process.
    pub auth_service_url: Option<Url>,
    pub auth_timeout: Duration,

    /// `None` disables the background purge of expired sessions.
    pub session_purge_interval: Option<Duration>,

    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
}

/// Error raised when the environment holds a value that cannot be used.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://quiz.db?mode=rwc".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let auth_service_url = match optional_var("AUTH_SERVICE_URL") {
            Some(raw) => Some(
                Url::parse(&raw)
                    .map_err(|e| ConfigError(format!("AUTH_SERVICE_URL '{}': {}", raw, e)))?,
            ),
            None => None,
        };

        let ttl_hours = parsed_var("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS);
        let session_ttl = ttl_hours
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError(format!("SESSION_TTL_HOURS {} is too large", ttl_hours)))?;

        let purge_secs = parsed_var(
            "SESSION_PURGE_INTERVAL_SECS",
            DEFAULT_SESSION_PURGE_INTERVAL_SECS,
        );

        Ok(Self {
            database_url,
            bind_addr,
            session_ttl,
            hash_concurrency: parsed_var("HASH_CONCURRENCY", default_hash_concurrency()).max(1),
            hash_timeout: Duration::from_millis(parsed_var(
                "HASH_TIMEOUT_MS",
                DEFAULT_HASH_TIMEOUT_MS,
            )),
            store_timeout: Duration::from_millis(parsed_var(
                "STORE_TIMEOUT_MS",
                DEFAULT_STORE_TIMEOUT_MS,
            )),
            auth_service_url,
            auth_timeout: Duration::from_millis(parsed_var(
                "AUTH_TIMEOUT_MS",
                DEFAULT_AUTH_TIMEOUT_MS,
            )),
            session_purge_interval: (purge_secs > 0).then(|| Duration::from_secs(purge_secs)),
            admin_username: optional_var("ADMIN_USERNAME"),
            admin_password: optional_var("ADMIN_PASSWORD"),
            admin_email: optional_var("ADMIN_EMAIL"),
        })
    }
}

/// Tracing filter directive from `RUST_LOG`. Needed before the rest of the
/// configuration so that its warnings reach the subscriber.
pub fn log_filter() -> String {
    env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

/// One core is left free for request handling.
pub fn default_hash_concurrency() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match optional_var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} has invalid value '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
