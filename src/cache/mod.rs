//! JSON cache over a key-value store
//!
//! This module provides a cache that stores serializable values as JSON strings
//! in a [`KeyValueStore`](crate::store::KeyValueStore), with configurable TTL
//! (time-to-live) values. Its public operations never fail: store and
//! serialization errors are logged and mapped to a fallback (`false`, a default
//! value, or [`Lookup::Absent`]).

mod manager;

pub use manager::{Cache, CacheError, Lookup, Ttl, DEFAULT_TTL_SECONDS};
