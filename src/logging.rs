//! Logging configuration using tracing
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary (or to the embedding application).

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Filters via `RUST_LOG` (default `warn`) and writes formatted events to
/// stderr, keeping stdout free for command output.
///
/// # Errors
/// Returns an error if a global subscriber has already been installed
pub fn init() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
}
