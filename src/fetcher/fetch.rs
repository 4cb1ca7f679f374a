//! The fetcher itself: cache lookup, refresh policy and degraded reads

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::envelope::CachedEnvelope;
use super::outcome::{FetchError, FetchOutcome, ValueStatus};
use crate::cache::{Cache, Ttl};

/// Default interval after which a cached value is refreshed
pub const DEFAULT_AUTO_REFRESH: Duration = Duration::from_secs(3600);

/// Tuning for a [`Fetcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherOptions {
    /// How long a produced value stays fresh; `None` disables auto-refresh
    pub auto_refresh_after: Option<Duration>,
    /// Expiry of the stored envelope; by default it is kept until reset
    pub ttl: Ttl,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            auto_refresh_after: Some(DEFAULT_AUTO_REFRESH),
            ttl: Ttl::Never,
        }
    }
}

/// Last value the producer handed us, if any
#[derive(Debug)]
enum FetcherState<T> {
    Uninitialized,
    HasValue(T),
}

/// Wraps an async producer so its results are cached and auto-refreshed
///
/// Calls behave like the producer, except that:
/// - a cached envelope is served without calling the producer until its
///   `refreshAfter` passes;
/// - once any call has succeeded, producer failures are logged and the last
///   good value is returned instead (a degraded read);
/// - only when no value was ever obtained does a call fail, with the producer
///   error as the source.
///
/// Concurrent calls on one fetcher are not coalesced: two calls that both see
/// a miss will both run the producer, and the later write wins.
pub struct Fetcher<A, T, P> {
    cache: Cache,
    key: String,
    producer: P,
    options: FetcherOptions,
    clock: Arc<dyn Clock>,
    state: Mutex<FetcherState<T>>,
    _args: PhantomData<fn(A)>,
}

impl<A, T: fmt::Debug, P> fmt::Debug for Fetcher<A, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<A, T, E, P, Fut> Fetcher<A, T, P>
where
    T: Serialize + DeserializeOwned + Clone,
    E: std::error::Error + 'static,
    P: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Wraps `producer`, caching its results under `key`
    ///
    /// # Arguments
    /// * `cache` - The cache to store envelopes in (may be shared)
    /// * `key` - Cache key for this fetcher; must not be shared with another fetcher
    /// * `producer` - Async function producing the value
    /// * `options` - Refresh interval and envelope TTL
    pub fn new(cache: Cache, key: impl Into<String>, producer: P, options: FetcherOptions) -> Self {
        Self {
            cache,
            key: key.into(),
            producer,
            options,
            clock: Arc::new(SystemClock),
            state: Mutex::new(FetcherState::Uninitialized),
            _args: PhantomData,
        }
    }

    /// Replaces the clock used to stamp and check `refreshAfter`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn options(&self) -> &FetcherOptions {
        &self.options
    }

    /// Calls the fetcher like the wrapped producer
    ///
    /// # Returns
    /// * `Ok(value)` - fresh, cached, or the last good value after a failed refresh
    /// * `Err(FetchError)` - the producer failed and no value was ever available
    pub async fn call(&self, args: A) -> Result<T, FetchError<E>> {
        self.fetch(args).await.into_result()
    }

    /// Calls the fetcher and reports how the value was obtained
    ///
    /// Never fails itself; the error for the no-value case is carried in the
    /// returned [`FetchOutcome`].
    pub async fn fetch(&self, args: A) -> FetchOutcome<T, E> {
        let now = self.clock.now_millis();

        match self.read_envelope().await {
            Some(envelope) if !envelope.is_stale(now) => {
                *self.state.lock().await = FetcherState::HasValue(envelope.value.clone());
                return FetchOutcome {
                    status: ValueStatus::Cached,
                    value: Ok(envelope.value),
                };
            }
            Some(envelope) => {
                debug!(key = %self.key, "cached value is stale, refreshing");
                *self.state.lock().await = FetcherState::HasValue(envelope.value);
            }
            None => debug!(key = %self.key, "cache miss, running producer"),
        }

        match self.refresh(now, args).await {
            Ok(value) => FetchOutcome {
                status: ValueStatus::UpToDate,
                value: Ok(value),
            },
            Err(source) => {
                let state = self.state.lock().await;
                match &*state {
                    FetcherState::HasValue(value) => {
                        warn!(key = %self.key, error = %source, "refresh failed, serving last good value");
                        FetchOutcome {
                            status: ValueStatus::Cached,
                            value: Ok(value.clone()),
                        }
                    }
                    FetcherState::Uninitialized => {
                        warn!(key = %self.key, error = %source, "refresh failed with no value to fall back on");
                        FetchOutcome {
                            status: ValueStatus::NoValueAvailable,
                            value: Err(FetchError::NoValueAvailable {
                                key: self.key.clone(),
                                source,
                            }),
                        }
                    }
                }
            }
        }
    }

    /// Deletes the cached envelope and forgets the last good value
    ///
    /// The envelope is cleared by writing a nil value, which the cache turns
    /// into a delete. The in-process value is only dropped if that succeeded,
    /// so a failed reset leaves the fetcher fully usable.
    ///
    /// # Returns
    /// Whether the delete succeeded
    pub async fn reset(&self) -> bool {
        let deleted = self.cache.set(&self.key, &None::<T>, Ttl::Never).await;
        if deleted {
            *self.state.lock().await = FetcherState::Uninitialized;
        }
        deleted
    }

    async fn read_envelope(&self) -> Option<CachedEnvelope<T>> {
        let json = self.cache.get_json(&self.key).await.into_option()?;
        let envelope = CachedEnvelope::from_json(json);
        if envelope.is_none() {
            debug!(key = %self.key, "stored entry is not a valid envelope, ignoring it");
        }
        envelope
    }

    /// Runs the producer and persists its value
    ///
    /// A failed cache write is logged but does not fail the refresh: the value
    /// is still adopted in process.
    async fn refresh(&self, now: i64, args: A) -> Result<T, E> {
        let value = (self.producer)(args).await?;

        let refresh_after = self
            .options
            .auto_refresh_after
            .map(|after| now.saturating_add(i64::try_from(after.as_millis()).unwrap_or(i64::MAX)));
        let envelope = CachedEnvelope {
            value: &value,
            refresh_after,
        };
        if !self.cache.set(&self.key, &envelope, self.options.ttl).await {
            warn!(key = %self.key, "failed to persist refreshed value");
        }

        *self.state.lock().await = FetcherState::HasValue(value.clone());
        Ok(value)
    }
}
