//! Cache manager for JSON values in a key-value store
//!
//! Provides a `Cache` that serializes values to JSON on write and parses them on
//! read. Every operation has an internal `Result` form; the public methods turn
//! errors into the documented fallback values.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::store::{CloseMode, KeyValueStore, RedisStore, StoreError};

/// Default expiry applied by [`Cache::set`] callers using `Ttl::default()`
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Errors that can occur inside a cache operation
///
/// These never leave the public API; they exist so failures can be logged
/// with their cause before being mapped to a fallback value.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store command failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The value could not be encoded, or the stored payload is not valid JSON
    /// for the requested type
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of reading a key from the cache
///
/// `Absent` covers a missing key as well as an unreadable one; `Present` may
/// hold any value, including JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// No usable entry under the key
    Absent,
    /// The decoded entry
    Present(T),
}

impl<T> Lookup<T> {
    /// Whether an entry was found
    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present(_))
    }

    /// Converts into an `Option`, losing nothing since `Absent` has no payload
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Present(value) => Some(value),
            Lookup::Absent => None,
        }
    }

    /// Returns the entry, or `default` if absent
    pub fn unwrap_or(self, default: T) -> T {
        self.into_option().unwrap_or(default)
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::Absent, Lookup::Present)
    }
}

/// How long a written entry lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Expire this many seconds after the write
    Seconds(u64),
    /// Keep until deleted or flushed
    Never,
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::Seconds(DEFAULT_TTL_SECONDS)
    }
}

impl Ttl {
    /// The expiry to pass to the store, `None` for no expiry
    pub fn as_seconds(self) -> Option<u64> {
        match self {
            Ttl::Seconds(secs) => Some(secs),
            Ttl::Never => None,
        }
    }
}

/// JSON get/set/flush over a shared store connection
///
/// Cloning is cheap: clones share the same store, so one `Cache` can back any
/// number of fetchers.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Creates a cache over the given store
    pub fn new<S: KeyValueStore + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Creates a cache over a store that is already shared
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Connects to the Redis server described by `config`
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self::new(RedisStore::open(config).await?))
    }

    /// Reads and decodes the entry under `key`
    ///
    /// # Returns
    /// * `Lookup::Present(value)` if the entry exists and decodes as `T`
    /// * `Lookup::Absent` if it is missing, the store failed, or decoding failed
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        match self.try_get(key).await {
            Ok(lookup) => lookup,
            Err(e) => {
                debug!(key, error = %e, "cache read failed, treating as absent");
                Lookup::Absent
            }
        }
    }

    /// Reads the entry under `key`, falling back to `default`
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).await.unwrap_or(default)
    }

    /// Writes `value` under `key` as JSON
    ///
    /// A value that serializes to JSON `null` (for example `None`) deletes the
    /// key instead. Each write replaces the previous expiry.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `value` - The data to cache (must implement Serialize)
    /// * `ttl` - Expiry of the new entry
    ///
    /// # Returns
    /// `true` on success, `false` if serialization or the store failed
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Ttl) -> bool {
        self.report("set", key, self.try_set(key, value, ttl).await)
    }

    /// Removes `key`. Returns `false` if the store failed.
    pub async fn delete(&self, key: &str) -> bool {
        let result = self.store.delete(key).await.map_err(CacheError::from);
        self.report("delete", key, result)
    }

    /// Removes every key in the current logical database
    pub async fn flush(&self) -> bool {
        let result = self.store.flush_all().await.map_err(CacheError::from);
        self.report("flush", "*", result)
    }

    /// Releases the underlying connection
    pub async fn close(&self, mode: CloseMode) {
        self.store.close(mode).await;
    }

    /// Reads the raw JSON entry under `key`
    pub async fn get_json(&self, key: &str) -> Lookup<Value> {
        self.get(key).await
    }

    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Lookup<T>, CacheError> {
        match self.store.get(key).await? {
            Some(payload) => Ok(Lookup::Present(serde_json::from_str(&payload)?)),
            None => Ok(Lookup::Absent),
        }
    }

    async fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Ttl,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_value(value)?;
        if json.is_null() {
            self.store.delete(key).await?;
            return Ok(());
        }

        let payload = serde_json::to_string(&json)?;
        self.store.set(key, &payload, ttl.as_seconds()).await?;
        Ok(())
    }

    fn report(&self, operation: &str, key: &str, result: Result<(), CacheError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(operation, key, error = %e, "cache operation failed");
                false
            }
        }
    }
}
