//! Store connection configuration
//!
//! Configuration is an explicit struct handed to the store at construction.
//! [`StoreConfig::from_env`] is the only place the process environment is read.

use thiserror::Error;

/// Default host when `HOST` is unset
pub const DEFAULT_HOST: &str = "localhost";

/// Default Redis port when `PORT` is unset
pub const DEFAULT_PORT: u16 = 6379;

/// Errors produced while building a [`StoreConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PORT` is not a valid TCP port
    #[error("Invalid port: '{0}'")]
    InvalidPort(String),

    /// `DB` is not a valid logical database index
    #[error("Invalid database index: '{0}'")]
    InvalidDb(String),
}

/// Where the backing store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Hostname or IP address of the store
    pub host: String,
    /// TCP port of the store
    pub port: u16,
    /// Logical database index; `flush` only clears this database
    pub db: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db: 0,
        }
    }
}

impl StoreConfig {
    /// Builds a config from the `HOST`, `PORT` and `DB` environment variables
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_except(&[])
    }

    /// Like [`StoreConfig::from_env`], but never reads the variables in `skip`
    ///
    /// Used when some settings are supplied explicitly, so an unrelated or
    /// malformed value in the environment cannot fail it.
    pub fn from_env_except(skip: &[&str]) -> Result<Self, ConfigError> {
        Self::from_lookup_except(|name| std::env::var(name).ok(), skip)
    }

    /// Builds a config from `lookup`, treating the variables in `skip` as unset
    pub fn from_lookup_except<F>(lookup: F, skip: &[&str]) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|name| {
            if skip.iter().any(|skipped| *skipped == name) {
                None
            } else {
                lookup(name)
            }
        })
    }

    /// Builds a config from an arbitrary variable lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable by name, or `None` if unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(db) = lookup("DB") {
            config.db = db
                .trim()
                .parse()
                .ok()
                .filter(|n: &i64| *n >= 0)
                .ok_or_else(|| ConfigError::InvalidDb(db.clone()))?;
        }

        Ok(config)
    }

    /// Connection URL understood by the Redis client
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}
