//! API configuration module.
//!
//! Configuration is loaded from environment variables (and a `.env` file, if
//! present) with fallback to defaults. It is read once at startup and shared
//! read-only afterwards.

use std::env;
use std::net::SocketAddr;

/// Development signing secret. Only used when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "orderdesk-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: String,

    /// Maximum pooled database connections
    pub database_max_connections: u32,

    /// Secret key for signing session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub jwt_lifetime_secs: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            database_path: "./orderdesk.db".to_string(),
            database_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 5 * 24 * 60 * 60, // 5 days
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// ## Variables
    /// - `BIND_ADDR` (default `0.0.0.0:3001`)
    /// - `DATABASE_PATH` (default `./orderdesk.db`)
    /// - `DATABASE_MAX_CONNECTIONS` (default `5`)
    /// - `JWT_SECRET` (development default)
    /// - `JWT_LIFETIME_SECS` (default 5 days)
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the environment may be set directly.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,

            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),

            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,

            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),

            jwt_lifetime_secs: parse_or(&lookup, "JWT_LIFETIME_SECS", defaults.jwt_lifetime_secs)?,
        };

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue("JWT_SECRET".to_string()));
        }
        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if config.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.database_path, "./orderdesk.db");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.jwt_lifetime_secs, 432_000);
        assert!(config.uses_development_secret());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_PATH", "/var/lib/orderdesk.db"),
            ("JWT_SECRET", "prod-secret"),
            ("JWT_LIFETIME_SECS", "3600"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_path, "/var/lib/orderdesk.db");
        assert_eq!(config.jwt_lifetime_secs, 3600);
        assert!(!config.uses_development_secret());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("BIND_ADDR", "nope")]),
            Err(ConfigError::InvalidValue(key)) if key == "BIND_ADDR"
        ));
        assert!(load(&[("JWT_LIFETIME_SECS", "-1")]).is_err());
        assert!(load(&[("JWT_SECRET", "")]).is_err());
        assert!(load(&[("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
    }
}
