//! In-process store backend
//!
//! Keeps entries in a map guarded by an async mutex. Expiry is tracked with
//! `tokio::time::Instant`, so tests running on a paused runtime can advance
//! past a TTL without sleeping. Expired entries are dropped when read and
//! swept on every write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::slot::ConnectionSlot;
use super::{CloseMode, KeyValueStore, StoreError};

#[derive(Debug)]
struct Entry {
    payload: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

type Entries = Arc<Mutex<HashMap<String, Entry>>>;

/// A [`KeyValueStore`] that lives entirely in process memory
#[derive(Debug)]
pub struct MemoryStore {
    slot: ConnectionSlot<Entries>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            slot: ConnectionSlot::new(Arc::new(Mutex::new(HashMap::new()))),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.slot
            .run(|entries| async move {
                let mut entries = entries.lock().await;
                let now = Instant::now();
                if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
                    entries.remove(key);
                }
                Ok(entries.get(key).map(|entry| entry.payload.clone()))
            })
            .await
    }

    async fn set(
        &self,
        key: &str,
        payload: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StoreError> {
        // Matches Redis, which rejects `SET ... EX 0`
        if ttl_seconds == Some(0) {
            return Err(StoreError::InvalidExpiry(0));
        }

        self.slot
            .run(|entries| async move {
                let now = Instant::now();
                let expires_at = ttl_seconds.map(|secs| now + Duration::from_secs(secs));
                let mut entries = entries.lock().await;
                // Expired keys are otherwise only dropped when read again
                entries.retain(|_, entry| !entry.is_expired(now));
                entries.insert(
                    key.to_string(),
                    Entry {
                        payload: payload.to_string(),
                        expires_at,
                    },
                );
                Ok(())
            })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.slot
            .run(|entries| async move {
                entries.lock().await.remove(key);
                Ok(())
            })
            .await
    }

    async fn flush_all(&self) -> Result<(), StoreError> {
        self.slot
            .run(|entries| async move {
                entries.lock().await.clear();
                Ok(())
            })
            .await
    }

    async fn close(&self, mode: CloseMode) {
        if self.slot.close(mode).await.is_some() {
            debug!(?mode, "memory store closed");
        }
    }
}
