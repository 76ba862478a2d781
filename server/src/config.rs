//! Configuration management for the items service.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A variable that is set but unparseable is an error, never a default.

use items_postgres::PostgresConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to a value that cannot be used.
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// The environment file exists but could not be read.
    #[error("Failed to load {file}: {reason}")]
    EnvFile {
        /// File name
        file: String,
        /// Loader message
        reason: String,
    },
}

/// Deployment environment, selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (default)
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Test,
}

impl Environment {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    /// Environment file loaded for this environment.
    #[must_use]
    pub fn env_file(self) -> String {
        format!(".env.{}", self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!("expected development, production or test, got {other}")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Deployment environment
    pub environment: Environment,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// `PostgreSQL` configuration
    pub database: PostgresConfig,
    /// Upper bound on a single persistence call, in milliseconds
    pub persistence_timeout_ms: u64,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    /// `host:port` listen address.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `APP_ENV` selects an optional `.env.{environment}` file, which is
    /// loaded first without overriding variables that are already set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the env file is unreadable, `DATABASE_URL`
    /// is missing, or any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").ok().filter(|v| !v.trim().is_empty()) {
            Some(value) => parse_value("APP_ENV", &value)?,
            None => Environment::default(),
        };

        let file = environment.env_file();
        if let Err(e) = dotenvy::from_filename(&file) {
            if !e.not_found() {
                return Err(ConfigError::EnvFile {
                    file,
                    reason: e.to_string(),
                });
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `DATABASE_URL` is missing or any variable
    /// holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = optional(&get, "APP_ENV", Environment::default())?;

        let url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database = PostgresConfig {
            max_connections: optional(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            min_connections: optional(&get, "DATABASE_MIN_CONNECTIONS", 1)?,
            connect_timeout: optional(&get, "DATABASE_CONNECT_TIMEOUT", 5)?,
            ..PostgresConfig::new(url)
        };
        if let Err(reason) = database.connect_options() {
            return Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                value: redact(&database.url),
                reason,
            });
        }
        if database.max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", "0", "must be at least 1"));
        }
        if database.min_connections > database.max_connections {
            return Err(invalid(
                "DATABASE_MIN_CONNECTIONS",
                &database.min_connections.to_string(),
                "must not exceed DATABASE_MAX_CONNECTIONS",
            ));
        }

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: optional(&get, "PORT", 3000)?,
            shutdown_timeout: optional(&get, "SHUTDOWN_TIMEOUT", 30)?,
        };

        let persistence_timeout_ms = optional(&get, "PERSISTENCE_TIMEOUT_MS", 5000)?;
        if persistence_timeout_ms == 0 {
            return Err(invalid("PERSISTENCE_TIMEOUT_MS", "0", "must be positive"));
        }

        Ok(Self {
            environment,
            server,
            database,
            persistence_timeout_ms,
        })
    }

    /// Persistence timeout as a [`Duration`].
    #[must_use]
    pub const fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    /// Graceful shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, &e.to_string()))
}

fn optional<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&'static str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    get(key).map_or(Ok(default), |value| parse_value(key, &value))
}

/// Hide the password in a connection URL before it reaches an error message.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.split_once(':') {
                Some((user, _)) => format!("{}{user}:***{}", &url[..scheme_end + 3], &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}
