//! jsoncache
//!
//! JSON get/set/flush over a key-value store, plus a fetch-and-cache wrapper
//! that keeps serving the last good value when its producer fails.
//!
//! # Example
//!
//! ```no_run
//! use jsoncache::{Cache, Fetcher, FetcherOptions, StoreConfig};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("upstream unavailable")]
//! struct Upstream;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Cache::connect(&StoreConfig::from_env()?).await?;
//! let rates = Fetcher::new(
//!     cache,
//!     "exchange-rates",
//!     |currency: String| async move { Ok::<_, Upstream>(vec![currency]) },
//!     FetcherOptions::default(),
//! );
//! let value = rates.call("EUR".to_string()).await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod logging;
pub mod refresh;
pub mod store;

pub use cache::{Cache, Lookup, Ttl};
pub use config::StoreConfig;
pub use fetcher::{FetchError, FetchOutcome, Fetcher, FetcherOptions, ValueStatus};
pub use store::{CloseMode, KeyValueStore, MemoryStore};
