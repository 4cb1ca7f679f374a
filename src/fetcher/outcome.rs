//! Result types returned by a fetcher call

use thiserror::Error;

/// Where the value returned by a fetcher call came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueStatus {
    /// The producer has never succeeded for this key
    NoValueAvailable,
    /// A previously produced value; this call did not refresh it
    Cached,
    /// This call ran the producer successfully
    UpToDate,
}

/// Error returned when a fetcher has no value to fall back on
#[derive(Debug, Error)]
pub enum FetchError<E: std::error::Error + 'static> {
    /// The producer failed and no earlier value exists
    #[error("No value available for cache key '{key}': producer failed")]
    NoValueAvailable {
        key: String,
        #[source]
        source: E,
    },
}

impl<E: std::error::Error + 'static> FetchError<E> {
    /// The cache key of the failed fetcher
    pub fn key(&self) -> &str {
        match self {
            FetchError::NoValueAvailable { key, .. } => key,
        }
    }

    /// The producer error that caused the failure
    pub fn producer_error(&self) -> &E {
        match self {
            FetchError::NoValueAvailable { source, .. } => source,
        }
    }

    /// Unwraps the producer error
    pub fn into_producer_error(self) -> E {
        match self {
            FetchError::NoValueAvailable { source, .. } => source,
        }
    }
}

/// Descriptor returned by [`Fetcher::fetch`](super::Fetcher::fetch)
///
/// `value` is `Err` exactly when `status` is [`ValueStatus::NoValueAvailable`].
#[derive(Debug)]
pub struct FetchOutcome<T, E: std::error::Error + 'static> {
    /// Freshness of the value
    pub status: ValueStatus,
    /// The value, or the error to surface when none was ever available
    pub value: Result<T, FetchError<E>>,
}

impl<T, E: std::error::Error + 'static> FetchOutcome<T, E> {
    /// Whether a value is available
    pub fn is_available(&self) -> bool {
        self.value.is_ok()
    }

    /// The error to surface, if no value was ever available
    pub fn error(&self) -> Option<&FetchError<E>> {
        self.value.as_ref().err()
    }

    pub fn into_result(self) -> Result<T, FetchError<E>> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error, PartialEq)]
    #[error("upstream timed out")]
    struct Upstream;

    #[test]
    fn test_fetch_error_preserves_source() {
        let err = FetchError::NoValueAvailable {
            key: "users".to_string(),
            source: Upstream,
        };

        assert_eq!(err.key(), "users");
        assert!(err.to_string().contains("users"));
        assert_eq!(err.source().unwrap().to_string(), "upstream timed out");
        assert_eq!(err.producer_error(), &Upstream);
        assert_eq!(err.into_producer_error(), Upstream);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok: FetchOutcome<u32, Upstream> = FetchOutcome {
            status: ValueStatus::Cached,
            value: Ok(3),
        };
        assert!(ok.is_available());
        assert!(ok.error().is_none());
        assert_eq!(ok.into_result().unwrap(), 3);

        let failed: FetchOutcome<u32, Upstream> = FetchOutcome {
            status: ValueStatus::NoValueAvailable,
            value: Err(FetchError::NoValueAvailable {
                key: "k".to_string(),
                source: Upstream,
            }),
        };
        assert!(!failed.is_available());
        assert_eq!(failed.error().map(FetchError::key), Some("k"));
    }
}
