//! Shared connection lifecycle for store backends

use std::future::Future;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::{CloseMode, StoreError};

/// Holds a backend connection handle and serializes its shutdown
///
/// Every command runs under a read lock; closing takes the write lock, so a
/// graceful close waits for in-flight commands to drain. An immediate close
/// cancels the token first, which aborts those commands at their next
/// suspension point.
#[derive(Debug)]
pub(crate) struct ConnectionSlot<C> {
    conn: RwLock<Option<C>>,
    cancel: CancellationToken,
}

impl<C: Clone + Send + Sync> ConnectionSlot<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self {
            conn: RwLock::new(Some(conn)),
            cancel: CancellationToken::new(),
        }
    }

    /// Runs `command` against the open connection
    ///
    /// # Returns
    /// * `Err(StoreError::Closed)` if the slot has been closed
    /// * `Err(StoreError::Cancelled)` if an immediate close interrupted the command
    /// * otherwise whatever the command returned
    pub(crate) async fn run<T, F, Fut>(&self, command: F) -> Result<T, StoreError>
    where
        F: FnOnce(C) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let guard = self.conn.read().await;
        let conn = guard.as_ref().ok_or(StoreError::Closed)?.clone();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            result = command(conn) => result,
        }
    }

    /// Closes the slot, returning the connection if it was still open
    pub(crate) async fn close(&self, mode: CloseMode) -> Option<C> {
        if mode == CloseMode::Immediate {
            self.cancel.cancel();
        }
        self.conn.write().await.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_command_result() {
        let slot = ConnectionSlot::new(7u32);
        let result = slot.run(|conn| async move { Ok(conn * 2) }).await;
        assert_eq!(result.unwrap(), 14);
    }

    #[tokio::test]
    async fn test_run_after_close_fails_with_closed() {
        let slot = ConnectionSlot::new(1u32);
        assert_eq!(slot.close(CloseMode::Graceful).await, Some(1));

        let result = slot.run(|conn| async move { Ok(conn) }).await;
        assert!(matches!(result, Err(StoreError::Closed)));
    }

    #[tokio::test]
    async fn test_second_close_returns_none() {
        let slot = ConnectionSlot::new(1u32);
        slot.close(CloseMode::Graceful).await;
        assert_eq!(slot.close(CloseMode::Immediate).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_graceful_close_waits_for_in_flight_command() {
        let slot = Arc::new(ConnectionSlot::new(5u32));

        let worker = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                slot.run(|conn| async move {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok(conn)
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        slot.close(CloseMode::Graceful).await;
        let result = worker.await.expect("worker should not panic");
        assert_eq!(result.unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_close_cancels_in_flight_command() {
        let slot = Arc::new(ConnectionSlot::new(5u32));

        let worker = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                slot.run(|conn| async move {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(conn)
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        slot.close(CloseMode::Immediate).await;
        let result = worker.await.expect("worker should not panic");
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }
}
