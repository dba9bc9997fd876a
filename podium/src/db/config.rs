//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use std::env;

use crate::config::{parse_env, ConfigError};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
        })?;
        let defaults = Self::development();

        let config = Self {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME", defaults.max_lifetime_secs)?,
        };

        if config.min_connections > config.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    config.max_connections
                ),
            });
        }
        Ok(config)
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/podium` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/podium".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Parse an optional variable, falling back to `default` when unset.
/// A present but malformed value is rejected.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_env(key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "DATABASE_URL",
        "DB_MAX_CONNECTIONS",
        "DB_MIN_CONNECTIONS",
        "DB_CONNECTION_TIMEOUT",
        "DB_IDLE_TIMEOUT",
        "DB_MAX_LIFETIME",
    ];

    fn clear() {
        // SAFETY: tests touching the environment run serially
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_missing_url() {
        clear();
        assert!(matches!(
            DatabaseConfig::from_env(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_defaults_and_overrides() {
        clear();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/podium_test");
            env::set_var("DB_MAX_CONNECTIONS", "25");
        }
        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/podium_test");
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_lifetime_secs, 1800);
        clear();
    }

    #[test]
    #[serial]
    fn test_malformed_pool_size_is_rejected() {
        clear();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/podium_test");
            env::set_var("DB_MAX_CONNECTIONS", "lots");
        }
        match DatabaseConfig::from_env() {
            Err(ConfigError::Invalid { var, .. }) => assert_eq!(var, "DB_MAX_CONNECTIONS"),
            other => panic!("expected an invalid value error, got {other:?}"),
        }
        clear();
    }

    #[test]
    #[serial]
    fn test_min_above_max_is_rejected() {
        clear();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/podium_test");
            env::set_var("DB_MAX_CONNECTIONS", "2");
            env::set_var("DB_MIN_CONNECTIONS", "5");
        }
        match DatabaseConfig::from_env() {
            Err(ConfigError::Invalid { var, .. }) => assert_eq!(var, "DB_MIN_CONNECTIONS"),
            other => panic!("expected an invalid value error, got {other:?}"),
        }
        clear();
    }
}
