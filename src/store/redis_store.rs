//! Redis store backend
//!
//! Uses a `ConnectionManager`, which reconnects on its own after transient
//! connection loss. Failed commands surface as [`StoreError::Redis`]; the
//! cache above logs them before mapping them to its fallback values.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info, warn};

use super::slot::ConnectionSlot;
use super::{CloseMode, KeyValueStore, StoreError};
use crate::config::StoreConfig;

/// A [`KeyValueStore`] backed by a Redis server
pub struct RedisStore {
    slot: ConnectionSlot<ConnectionManager>,
    endpoint: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to the server described by `config`
    ///
    /// # Returns
    /// * `Ok(RedisStore)` once the initial connection is established
    /// * `Err(StoreError::Redis)` if the URL is invalid or the server is unreachable
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let endpoint = config.url();
        let client = redis::Client::open(endpoint.as_str())?;
        let manager = client.get_connection_manager().await.map_err(|e| {
            warn!(endpoint = %endpoint, error = %e, "failed to connect to redis");
            StoreError::from(e)
        })?;

        info!(endpoint = %endpoint, "connected to redis");
        Ok(Self {
            slot: ConnectionSlot::new(manager),
            endpoint,
        })
    }

    fn log_failure<T>(&self, command: &str, result: Result<T, StoreError>) -> Result<T, StoreError> {
        log_command_failure(&self.endpoint, command, result)
    }
}

/// Logs a failed command with its endpoint at debug level
///
/// The cache reports the same failure at warn, so this only adds detail.
fn log_command_failure<T>(
    endpoint: &str,
    command: &str,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    if let Err(ref e) = result {
        debug!(endpoint, command, error = %e, "redis command failed");
    }
    result
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self
            .slot
            .run(|mut conn| async move {
                let payload: Option<String> =
                    redis::cmd("GET").arg(key).query_async(&mut conn).await?;
                Ok::<_, StoreError>(payload)
            })
            .await;
        self.log_failure("GET", result)
    }

    async fn set(
        &self,
        key: &str,
        payload: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StoreError> {
        let result = self
            .slot
            .run(|mut conn| async move {
                let mut cmd = redis::cmd("SET");
                cmd.arg(key).arg(payload);
                if let Some(secs) = ttl_seconds {
                    cmd.arg("EX").arg(secs);
                }
                let _: () = cmd.query_async(&mut conn).await?;
                Ok::<_, StoreError>(())
            })
            .await;
        self.log_failure("SET", result)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let result = self
            .slot
            .run(|mut conn| async move {
                let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
                Ok::<_, StoreError>(())
            })
            .await;
        self.log_failure("DEL", result)
    }

    async fn flush_all(&self) -> Result<(), StoreError> {
        let result = self
            .slot
            .run(|mut conn| async move {
                let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
                Ok::<_, StoreError>(())
            })
            .await;
        self.log_failure("FLUSHDB", result)
    }

    async fn close(&self, mode: CloseMode) {
        // Dropping the last manager clone closes the socket
        if self.slot.close(mode).await.is_some() {
            debug!(endpoint = %self.endpoint, ?mode, "redis store closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn log_at(level: Level) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let result: Result<(), StoreError> =
                log_command_failure("redis://localhost:6379/0", "GET", Err(StoreError::Closed));
            assert!(result.is_err());
        });
        captured.text()
    }

    #[test]
    fn test_command_failure_is_not_logged_at_warn() {
        assert_eq!(log_at(Level::WARN), "");
    }

    #[test]
    fn test_command_failure_is_logged_at_debug() {
        let text = log_at(Level::DEBUG);
        assert!(text.contains("redis command failed"), "{}", text);
        assert!(text.contains("GET"), "{}", text);
    }

    #[test]
    fn test_success_is_not_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(log_command_failure("redis://x", "SET", Ok(1)).unwrap(), 1);
        });
        assert_eq!(captured.text(), "");
    }
}
