//! Command-line interface for inspecting a cache
//!
//! This module handles parsing of CLI arguments using clap and runs the parsed
//! command against a [`Cache`]. Connection settings come from `HOST`, `PORT`
//! and `DB` (see [`StoreConfig::from_env`]) and can be overridden by flags.

use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::cache::{Cache, Lookup, Ttl, DEFAULT_TTL_SECONDS};
use crate::config::{ConfigError, StoreConfig};
use crate::store::StoreError;

/// Error types for the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// A value argument is not valid JSON
    #[error("Invalid JSON value '{input}': {source}")]
    InvalidJson {
        input: String,
        #[source]
        source: serde_json::Error,
    },

    /// Connection settings are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Could not connect to the store
    #[error("Could not connect to store: {0}")]
    Connect(#[from] StoreError),

    /// `get` found nothing and no default was given
    #[error("Key not found: '{0}'")]
    NotFound(String),

    /// The cache reported failure
    #[error("{0} failed")]
    OperationFailed(&'static str),
}

/// jsoncache - read and write JSON values in a key-value store
#[derive(Parser, Debug)]
#[command(name = "jsoncache")]
#[command(about = "Read and write JSON values in a key-value store")]
#[command(version)]
pub struct Cli {
    /// Store host (overrides HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Store port (overrides PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Logical database index (overrides DB)
    #[arg(long, global = true)]
    pub db: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations available from the command line
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the JSON value stored under KEY
    Get {
        key: String,
        /// JSON printed when the key is absent, instead of failing
        #[arg(long, value_parser = parse_json_arg)]
        default: Option<Value>,
    },
    /// Store a JSON value under KEY (`null` deletes the key)
    Set {
        key: String,
        #[arg(value_parser = parse_json_arg)]
        value: Value,
        /// Expiry in seconds [default: 3600]
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..), conflicts_with = "no_expiry")]
        ttl: Option<u64>,
        /// Keep the entry until it is deleted or flushed
        #[arg(long)]
        no_expiry: bool,
    },
    /// Delete KEY
    Del { key: String },
    /// Remove every key in the logical database
    Flush,
}

impl Command {
    /// Expiry requested by a `set` command
    fn ttl(&self) -> Ttl {
        match self {
            Command::Set { no_expiry: true, .. } => Ttl::Never,
            Command::Set { ttl: Some(secs), .. } => Ttl::Seconds(*secs),
            _ => Ttl::Seconds(DEFAULT_TTL_SECONDS),
        }
    }
}

/// Parses a command-line argument as JSON
///
/// # Returns
/// * `Ok(Value)` if the string is valid JSON
/// * `Err(CliError::InvalidJson)` otherwise
pub fn parse_json_arg(s: &str) -> Result<Value, CliError> {
    serde_json::from_str(s).map_err(|source| CliError::InvalidJson {
        input: s.to_string(),
        source,
    })
}

impl Cli {
    /// Resolves the store configuration
    ///
    /// Flags win; the environment is only consulted for settings without a flag.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let base = StoreConfig::from_env_except(&self.flagged_vars())?;
        Ok(self.apply_flags(base))
    }

    /// Same as [`Cli::store_config`], reading variables through `lookup`
    pub fn store_config_from<F>(&self, lookup: F) -> Result<StoreConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = StoreConfig::from_lookup_except(lookup, &self.flagged_vars())?;
        Ok(self.apply_flags(base))
    }

    /// Environment variables made redundant by explicit flags
    fn flagged_vars(&self) -> Vec<&'static str> {
        let mut vars = Vec::new();
        if self.host.is_some() {
            vars.push("HOST");
        }
        if self.port.is_some() {
            vars.push("PORT");
        }
        if self.db.is_some() {
            vars.push("DB");
        }
        vars
    }

    fn apply_flags(&self, mut config: StoreConfig) -> StoreConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(db) = self.db {
            config.db = i64::from(db);
        }
        config
    }
}

/// Runs `command` against `cache`
///
/// # Returns
/// The text to print on success
pub async fn execute(command: &Command, cache: &Cache) -> Result<String, CliError> {
    match command {
        Command::Get { key, default } => match (cache.get_json(key).await, default) {
            (Lookup::Present(value), _) => Ok(value.to_string()),
            (Lookup::Absent, Some(default)) => Ok(default.to_string()),
            (Lookup::Absent, None) => Err(CliError::NotFound(key.clone())),
        },
        Command::Set { key, value, .. } => {
            if cache.set(key, value, command.ttl()).await {
                Ok("OK".to_string())
            } else {
                Err(CliError::OperationFailed("set"))
            }
        }
        Command::Del { key } => {
            if cache.delete(key).await {
                Ok("OK".to_string())
            } else {
                Err(CliError::OperationFailed("del"))
            }
        }
        Command::Flush => {
            if cache.flush().await {
                Ok("OK".to_string())
            } else {
                Err(CliError::OperationFailed("flush"))
            }
        }
    }
}
