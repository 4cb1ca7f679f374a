//! Background data refresh system
//!
//! Periodically calls a [`Fetcher`] in the background so its cached value is
//! refreshed as soon as it goes stale, rather than on the next caller's
//! request. Progress is reported over a tokio channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::fetcher::{Fetcher, ValueStatus};

/// Messages sent from the background task to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshMessage {
    /// A refresh cycle started
    RefreshStarted,
    /// The fetcher returned a value
    Refreshed { key: String, status: ValueStatus },
    /// The fetcher has no value and the producer failed
    RefreshError { key: String, message: String },
    /// A refresh cycle completed
    RefreshCompleted,
}

/// Configuration for the background refresh
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refresh cycles
    pub interval: Duration,
    /// Whether the background task runs at all
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

#[derive(Debug)]
enum RefreshCommand {
    RefreshNow,
    Shutdown,
}

/// Handle for controlling a background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    command_tx: mpsc::Sender<RefreshCommand>,
}

impl RefreshHandle {
    /// Spawns a task that calls `fetcher` with `args` on every interval tick
    ///
    /// The first, immediate tick is skipped. With `config.enabled == false`
    /// no task is spawned and the receiver never yields a message.
    ///
    /// # Arguments
    /// * `fetcher` - The fetcher to keep warm
    /// * `args` - Arguments passed to the fetcher on each cycle
    /// * `config` - Interval and on/off switch
    pub fn spawn<A, T, E, P, Fut>(fetcher: Arc<Fetcher<A, T, P>>, args: A, config: RefreshConfig) -> Self
    where
        A: Clone + Send + Sync + 'static,
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        E: std::error::Error + Send + 'static,
        P: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (command_tx, mut command_rx) = mpsc::channel(4);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {}
                        command = command_rx.recv() => match command {
                            Some(RefreshCommand::RefreshNow) => {}
                            Some(RefreshCommand::Shutdown) | None => break,
                        },
                    }

                    if !run_cycle(&fetcher, args.clone(), &msg_tx).await {
                        break;
                    }
                }
                debug!(key = fetcher.key(), "background refresh stopped");
            });
        }

        Self {
            receiver: msg_rx,
            command_tx,
        }
    }

    /// Requests an immediate refresh cycle
    pub async fn request_refresh(&self) {
        let _ = self.command_tx.send(RefreshCommand::RefreshNow).await;
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(RefreshCommand::Shutdown).await;
    }
}

/// Runs one cycle; returns `false` once the receiving side is gone
async fn run_cycle<A, T, E, P, Fut>(
    fetcher: &Fetcher<A, T, P>,
    args: A,
    tx: &mpsc::Sender<RefreshMessage>,
) -> bool
where
    T: Serialize + DeserializeOwned + Clone,
    E: std::error::Error + 'static,
    P: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if tx.send(RefreshMessage::RefreshStarted).await.is_err() {
        return false;
    }

    let outcome = fetcher.fetch(args).await;
    let key = fetcher.key().to_string();
    let message = match outcome.error() {
        Some(e) => RefreshMessage::RefreshError {
            key,
            message: e.to_string(),
        },
        None => RefreshMessage::Refreshed {
            key,
            status: outcome.status,
        },
    };

    tx.send(message).await.is_ok() && tx.send(RefreshMessage::RefreshCompleted).await.is_ok()
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
