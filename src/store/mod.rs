//! Key-value store backends
//!
//! The cache layer talks to its backing store exclusively through the
//! [`KeyValueStore`] trait: raw string payloads in, raw string payloads out,
//! with an optional expiry in seconds. Persistence, expiry and network handling
//! are the store's business; nothing above this module knows which backend is
//! in use.

mod memory;
mod redis_store;
mod slot;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection was closed before or during the command
    #[error("Store connection is closed")]
    Closed,

    /// The command was dropped by an immediate close
    #[error("Command cancelled by immediate close")]
    Cancelled,

    /// The backend rejected the expiry value
    #[error("Invalid expire time: {0} seconds")]
    InvalidExpiry(u64),

    /// Redis client or protocol failure
    #[error("Redis command failed: {0}")]
    Redis(#[from] redis::RedisError),
}

/// How a store connection should be released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseMode {
    /// Let in-flight commands finish, then close
    #[default]
    Graceful,
    /// Drop the connection now, cancelling in-flight commands
    Immediate,
}

/// The narrow interface the cache needs from a key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw payload stored under `key`, or `None` if there is none
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `payload` under `key`, replacing any previous entry and its expiry
    ///
    /// `ttl_seconds = None` stores the entry without expiry.
    async fn set(&self, key: &str, payload: &str, ttl_seconds: Option<u64>)
        -> Result<(), StoreError>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key in the current logical database
    async fn flush_all(&self) -> Result<(), StoreError>;

    /// Releases the connection. Subsequent commands fail with [`StoreError::Closed`].
    async fn close(&self, mode: CloseMode);
}
