//! Fetch-and-cache wrapper around an async producer
//!
//! A [`Fetcher`] has the same call shape as the producer it wraps, but serves
//! results from the [`Cache`](crate::cache::Cache), refreshes them once they go
//! stale, and keeps returning the last good value when a refresh fails. A call
//! only fails when no value has ever been produced.

mod clock;
mod envelope;
mod fetch;
mod outcome;

pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::CachedEnvelope;
pub use fetch::{Fetcher, FetcherOptions, DEFAULT_AUTO_REFRESH};
pub use outcome::{FetchError, FetchOutcome, ValueStatus};
